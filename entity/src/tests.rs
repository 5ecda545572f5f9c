//! # 实体定义测试

use crate::enums::{CompetitionLevel, NotificationType, TalentStatus, TalentType, UserRole};
use crate::{notifications, talents};
use sea_orm::{ActiveEnum, Set, prelude::Uuid};

#[tokio::test]
async fn test_talent_active_model_defaults() {
    let talent = talents::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(Uuid::new_v4()),
        talent_type: Set(TalentType::MinatBakat),
        status: Set(TalentStatus::Pending),
        ..Default::default()
    };

    assert_eq!(talent.status.as_ref(), &TalentStatus::Pending);
    assert!(talent.verified_by.is_not_set());
    assert!(talent.rejection_reason.is_not_set());
}

#[test]
fn test_enum_db_values_match_wire_values() {
    assert_eq!(UserRole::AdminSekolah.to_value(), "admin_sekolah");
    assert_eq!(TalentType::PesertaLomba.to_value(), "peserta_lomba");
    assert_eq!(
        serde_json::to_string(&TalentType::PesertaLomba).unwrap(),
        "\"peserta_lomba\""
    );
    assert_eq!(
        CompetitionLevel::try_from_value(&"internasional".to_string()).unwrap(),
        CompetitionLevel::Internasional
    );
    assert!(CompetitionLevel::try_from_value(&"galaksi".to_string()).is_err());
}

#[test]
fn test_notification_type_serializes_as_type_field() {
    let model = notifications::Model {
        id: Uuid::nil(),
        user_id: Uuid::nil(),
        talent_id: None,
        notification_type: NotificationType::TalentApproved,
        title: "Talenta Disetujui".to_string(),
        message: "Talenta Anda telah disetujui".to_string(),
        is_read: false,
        created_at: chrono::NaiveDateTime::default(),
    };
    let value = serde_json::to_value(&model).unwrap();
    assert_eq!(value["type"], "talent_approved");
}

#[test]
fn test_training_has_no_certificate() {
    assert!(!TalentType::PesertaPelatihan.accepts_certificate());
    assert!(TalentType::MinatBakat.accepts_certificate());
}
