//! # 人才审核流程集成测试
//!
//! 在内存数据库上验证申报、修改、审核与批量审核的完整流程

use entity::enums::{NotificationType, TalentStatus, TalentType};
use entity::{
    notifications, talent_competition_mentors, talent_competition_participants, talent_interests,
    talent_trainings, talents, users,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use uuid::Uuid;

use sipodi::error::AppError;
use sipodi::management::services::talents::{
    TalentListQuery, TalentsService, UpdateTalentRequest,
};
use sipodi::testing::*;

/// 一所学校、一名管理员和一名 GTK
struct Scenario {
    app: TestApp,
    admin: users::Model,
    gtk: users::Model,
}

impl Scenario {
    async fn setup() -> Self {
        let app = TestApp::new().await.unwrap();
        let school = SchoolFixture::new().insert(app.db()).await.unwrap();
        let admin = UserFixture::school_admin(school.id)
            .insert(app.db())
            .await
            .unwrap();
        let gtk = UserFixture::gtk(school.id)
            .full_name("Ani Lestari")
            .insert(app.db())
            .await
            .unwrap();
        Self { app, admin, gtk }
    }

    fn service(&self) -> TalentsService<'_> {
        TalentsService::new(&self.app.context)
    }

    async fn create(&self, talent_type: TalentType) -> Uuid {
        self.service()
            .create(&auth_of(&self.gtk), talent_request(talent_type))
            .await
            .unwrap()
            .id
    }
}

/// 每张明细表中属于该人才的行数，顺序为培训、指导、参赛、兴趣
async fn detail_row_counts(db: &DatabaseConnection, talent_id: Uuid) -> [u64; 4] {
    [
        talent_trainings::Entity::find()
            .filter(talent_trainings::Column::TalentId.eq(talent_id))
            .count(db)
            .await
            .unwrap(),
        talent_competition_mentors::Entity::find()
            .filter(talent_competition_mentors::Column::TalentId.eq(talent_id))
            .count(db)
            .await
            .unwrap(),
        talent_competition_participants::Entity::find()
            .filter(talent_competition_participants::Column::TalentId.eq(talent_id))
            .count(db)
            .await
            .unwrap(),
        talent_interests::Entity::find()
            .filter(talent_interests::Column::TalentId.eq(talent_id))
            .count(db)
            .await
            .unwrap(),
    ]
}

async fn load_talent(db: &DatabaseConnection, id: Uuid) -> talents::Model {
    talents::Entity::find_by_id(id).one(db).await.unwrap().unwrap()
}

#[rstest]
#[case::training(TalentType::PesertaPelatihan, [1, 0, 0, 0])]
#[case::mentor(TalentType::PembimbingLomba, [0, 1, 0, 0])]
#[case::participant(TalentType::PesertaLomba, [0, 0, 1, 0])]
#[case::interest(TalentType::MinatBakat, [0, 0, 0, 1])]
#[tokio::test]
async fn test_create_writes_exactly_one_matching_detail_row(
    #[case] talent_type: TalentType,
    #[case] expected: [u64; 4],
) {
    let s = Scenario::setup().await;
    let created = s
        .service()
        .create(&auth_of(&s.gtk), talent_request(talent_type))
        .await
        .unwrap();

    assert_eq!(created.status, TalentStatus::Pending);
    assert_eq!(created.talent_type, talent_type);
    assert!(created.verified_by.is_none());
    assert_eq!(detail_row_counts(s.app.db(), created.id).await, expected);
}

#[tokio::test]
async fn test_create_reports_every_missing_detail_field() {
    let s = Scenario::setup().await;
    let mut request = talent_request(TalentType::PembimbingLomba);
    request.detail = Some(json!({ "competition_name": "OSN" }));

    let err = s
        .service()
        .create(&auth_of(&s.gtk), request)
        .await
        .unwrap_err();
    let fields: Vec<String> = err
        .field_errors()
        .unwrap()
        .iter()
        .map(|e| e.field.clone())
        .collect();
    assert_eq!(
        fields,
        vec!["detail.level", "detail.organizer", "detail.field", "detail.achievement"]
    );
    assert_eq!(talents::Entity::find().count(s.app.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_only_gtk_may_create_talents() {
    let s = Scenario::setup().await;
    let err = s
        .service()
        .create(&auth_of(&s.admin), talent_request(TalentType::MinatBakat))
        .await
        .unwrap_err();
    assert!(matches!(err.root(), AppError::Forbidden { .. }));
}

#[tokio::test]
async fn test_training_drops_certificate_url() {
    let s = Scenario::setup().await;
    let mut request = talent_request(TalentType::PesertaPelatihan);
    request.certificate_url = Some("http://files/sertifikat.pdf".to_string());
    let training = s.service().create(&auth_of(&s.gtk), request).await.unwrap();
    assert!(training.certificate_url.is_none());

    let mut request = talent_request(TalentType::MinatBakat);
    request.certificate_url = Some("http://files/sertifikat.pdf".to_string());
    let interest = s.service().create(&auth_of(&s.gtk), request).await.unwrap();
    assert_eq!(
        interest.certificate_url.as_deref(),
        Some("http://files/sertifikat.pdf")
    );
}

#[rstest]
#[case::approve(false)]
#[case::reject(true)]
#[tokio::test]
async fn test_second_verification_is_rejected_and_changes_nothing(#[case] reject: bool) {
    let s = Scenario::setup().await;
    let id = s.create(TalentType::MinatBakat).await;
    let admin = auth_of(&s.admin);

    s.service().approve(&admin, id).await.unwrap();
    let before = load_talent(s.app.db(), id).await;

    let err = if reject {
        s.service()
            .reject(&admin, id, Some("Dokumen buram".to_string()))
            .await
            .unwrap_err()
    } else {
        s.service().approve(&admin, id).await.unwrap_err()
    };
    assert!(matches!(err.root(), AppError::AlreadyVerified));

    let after = load_talent(s.app.db(), id).await;
    assert_eq!(after.status, before.status);
    assert_eq!(after.verified_by, before.verified_by);
    assert_eq!(after.verified_at, before.verified_at);
    assert_eq!(after.rejection_reason, before.rejection_reason);
}

#[tokio::test]
async fn test_update_resets_verified_talent_to_pending() {
    let s = Scenario::setup().await;
    let id = s.create(TalentType::PesertaLomba).await;
    s.service()
        .reject(&auth_of(&s.admin), id, Some("Sertifikat tidak terbaca".to_string()))
        .await
        .unwrap();

    let mut detail = sample_detail(TalentType::PesertaLomba);
    detail["achievement"] = json!("Juara 1");
    let updated = s
        .service()
        .update(
            &auth_of(&s.gtk),
            id,
            UpdateTalentRequest {
                talent_type: None,
                detail: Some(detail),
                certificate_url: None,
                upload_id: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, TalentStatus::Pending);
    let row = load_talent(s.app.db(), id).await;
    assert_eq!(row.status, TalentStatus::Pending);
    assert!(row.verified_by.is_none());
    assert!(row.verified_at.is_none());
    assert!(row.rejection_reason.is_none());
    assert_eq!(detail_row_counts(s.app.db(), id).await, [0, 0, 1, 0]);
}

#[tokio::test]
async fn test_update_cannot_change_type_or_touch_foreign_talent() {
    let s = Scenario::setup().await;
    let id = s.create(TalentType::MinatBakat).await;

    let err = s
        .service()
        .update(
            &auth_of(&s.gtk),
            id,
            UpdateTalentRequest {
                talent_type: Some(TalentType::PesertaPelatihan),
                detail: Some(sample_detail(TalentType::PesertaPelatihan)),
                certificate_url: None,
                upload_id: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.field_errors().unwrap()[0].field, "talent_type");

    let other = UserFixture::gtk(s.gtk.school_id.unwrap())
        .insert(s.app.db())
        .await
        .unwrap();
    let err = s
        .service()
        .update(
            &auth_of(&other),
            id,
            UpdateTalentRequest {
                talent_type: None,
                detail: Some(sample_detail(TalentType::MinatBakat)),
                certificate_url: None,
                upload_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err.root(), AppError::Forbidden { .. }));
}

#[tokio::test]
async fn test_batch_approve_reports_each_failure_once() {
    let s = Scenario::setup().await;
    let admin = auth_of(&s.admin);
    let pending_a = s.create(TalentType::MinatBakat).await;
    let pending_b = s.create(TalentType::PesertaPelatihan).await;
    let verified = s.create(TalentType::PembimbingLomba).await;
    s.service().approve(&admin, verified).await.unwrap();
    let missing = Uuid::new_v4();

    let result = s
        .service()
        .batch_approve(&admin, vec![pending_a, verified, missing, pending_b])
        .await
        .unwrap();

    assert_eq!(result.success_count, 2);
    assert_eq!(result.failed_count, 2);
    let failed: Vec<Uuid> = result.failed_ids.iter().map(|f| f.id).collect();
    assert_eq!(failed, vec![verified, missing]);
    assert_eq!(result.failed_ids[0].reason, "Talenta sudah diverifikasi");
    assert_eq!(result.failed_ids[1].reason, "Talenta tidak ditemukan");
    assert_eq!(
        load_talent(s.app.db(), pending_b).await.status,
        TalentStatus::Approved
    );
}

#[tokio::test]
async fn test_batch_reject_needs_reason_and_ids() {
    let s = Scenario::setup().await;
    let admin = auth_of(&s.admin);
    let id = s.create(TalentType::MinatBakat).await;

    let err = s
        .service()
        .batch_reject(&admin, vec![id], Some(String::new()))
        .await
        .unwrap_err();
    assert_eq!(err.field_errors().unwrap()[0].field, "rejection_reason");

    let err = s
        .service()
        .batch_reject(&admin, Vec::new(), Some("Tidak lengkap".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.field_errors().unwrap()[0].field, "talent_ids");

    let result = s
        .service()
        .batch_reject(&admin, vec![id], Some("Tidak lengkap".to_string()))
        .await
        .unwrap();
    assert_eq!(result.success_count, 1);
    assert_eq!(
        load_talent(s.app.db(), id).await.rejection_reason.as_deref(),
        Some("Tidak lengkap")
    );
}

#[tokio::test]
async fn test_blank_reject_reason_leaves_talent_untouched() {
    let s = Scenario::setup().await;
    let id = s.create(TalentType::MinatBakat).await;

    let err = s
        .service()
        .reject(&auth_of(&s.admin), id, Some("   ".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.field_errors().unwrap()[0].field, "rejection_reason");

    let row = load_talent(s.app.db(), id).await;
    assert_eq!(row.status, TalentStatus::Pending);
    assert!(row.verified_by.is_none());
    assert_eq!(
        notifications::Entity::find().count(s.app.db()).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_only_same_school_admin_can_approve() {
    let s = Scenario::setup().await;
    let mut request = talent_request(TalentType::MinatBakat);
    request.detail = Some(json!({
        "interest_name": "Robotics",
        "description": "Pembina ekstrakurikuler robotik"
    }));
    let id = s
        .service()
        .create(&auth_of(&s.gtk), request)
        .await
        .unwrap()
        .id;

    let other_school = SchoolFixture::new().insert(s.app.db()).await.unwrap();
    let outsider = UserFixture::school_admin(other_school.id)
        .insert(s.app.db())
        .await
        .unwrap();
    let err = s
        .service()
        .approve(&auth_of(&outsider), id)
        .await
        .unwrap_err();
    assert!(matches!(err.root(), AppError::Forbidden { .. }));
    assert_eq!(load_talent(s.app.db(), id).await.status, TalentStatus::Pending);

    let approved = s.service().approve(&auth_of(&s.admin), id).await.unwrap();
    assert_eq!(approved.status, TalentStatus::Approved);
    assert_eq!(approved.verified_by.unwrap().id, s.admin.id);

    let sent = notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(s.gtk.id))
        .all(s.app.db())
        .await
        .unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].notification_type, NotificationType::TalentApproved);
    assert_eq!(sent[0].talent_id, Some(id));
    assert_eq!(sent[0].message, "Talenta Anda telah disetujui");
}

#[tokio::test]
async fn test_rejection_notification_carries_reason() {
    let s = Scenario::setup().await;
    let id = s.create(TalentType::PesertaPelatihan).await;
    s.service()
        .reject(&auth_of(&s.admin), id, Some("Tanggal tidak sesuai".to_string()))
        .await
        .unwrap();

    let sent = notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(s.gtk.id))
        .one(s.app.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sent.notification_type, NotificationType::TalentRejected);
    assert_eq!(sent.message, "Talenta Anda ditolak. Alasan: Tanggal tidak sesuai");
}

#[tokio::test]
async fn test_get_detail_is_a_pure_read() {
    let s = Scenario::setup().await;
    let id = s.create(TalentType::PembimbingLomba).await;
    let talent = load_talent(s.app.db(), id).await;

    let first = s.service().get_detail(&talent).await.unwrap();
    let second = s.service().get_detail(&talent).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.0.talent_type(), TalentType::PembimbingLomba);
    assert_eq!(load_talent(s.app.db(), id).await, talent);
}

#[tokio::test]
async fn test_delete_removes_detail_row() {
    let s = Scenario::setup().await;
    let id = s.create(TalentType::PesertaLomba).await;
    assert_eq!(detail_row_counts(s.app.db(), id).await, [0, 0, 1, 0]);

    s.service().delete(&auth_of(&s.gtk), id).await.unwrap();

    assert!(talents::Entity::find_by_id(id).one(s.app.db()).await.unwrap().is_none());
    assert_eq!(detail_row_counts(s.app.db(), id).await, [0, 0, 0, 0]);
}

#[tokio::test]
async fn test_list_is_scoped_by_role() {
    let s = Scenario::setup().await;
    s.create(TalentType::MinatBakat).await;
    s.create(TalentType::PesertaPelatihan).await;

    let other_school = SchoolFixture::new().insert(s.app.db()).await.unwrap();
    let outsider_gtk = UserFixture::gtk(other_school.id)
        .full_name("Budi Santoso")
        .insert(s.app.db())
        .await
        .unwrap();
    s.service()
        .create(&auth_of(&outsider_gtk), talent_request(TalentType::MinatBakat))
        .await
        .unwrap();

    let admin_view = s
        .service()
        .list(&auth_of(&s.admin), TalentListQuery::default())
        .await
        .unwrap();
    assert_eq!(admin_view.pagination.total, 2);
    assert!(admin_view.items.iter().all(|t| t.user.id == s.gtk.id));

    let root = UserFixture::super_admin().insert(s.app.db()).await.unwrap();
    let everything = s
        .service()
        .list(
            &auth_of(&root),
            TalentListQuery {
                search: Some("budi".to_string()),
                ..TalentListQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(everything.pagination.total, 1);
    assert_eq!(everything.items[0].user.full_name, "Budi Santoso");

    let mine = s
        .service()
        .list_own(&auth_of(&outsider_gtk), TalentListQuery::default())
        .await
        .unwrap();
    assert_eq!(mine.pagination.total, 1);
}

#[tokio::test]
async fn test_pending_list_hides_decided_talents() {
    let s = Scenario::setup().await;
    let admin = auth_of(&s.admin);
    let approved = s.create(TalentType::MinatBakat).await;
    let waiting = s.create(TalentType::MinatBakat).await;
    s.service().approve(&admin, approved).await.unwrap();

    let pending = s
        .service()
        .list_pending(&admin, TalentListQuery::default())
        .await
        .unwrap();
    let ids: Vec<Uuid> = pending.items.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![waiting]);
}

#[tokio::test]
async fn test_huge_page_number_returns_empty_page() {
    let s = Scenario::setup().await;
    s.create(TalentType::MinatBakat).await;

    let page = s
        .service()
        .list_own(
            &auth_of(&s.gtk),
            TalentListQuery {
                page: Some(u64::MAX),
                ..TalentListQuery::default()
            },
        )
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.pagination.total, 1);
}

#[tokio::test]
async fn test_concurrent_approvals_have_one_winner() {
    init_test_env();
    let (db, _dir) = create_temp_db().await.unwrap();
    let school = SchoolFixture::new().insert(&db).await.unwrap();
    let first_admin = UserFixture::school_admin(school.id)
        .insert(&db)
        .await
        .unwrap();
    let second_admin = UserFixture::school_admin(school.id)
        .insert(&db)
        .await
        .unwrap();
    let gtk = UserFixture::gtk(school.id).insert(&db).await.unwrap();
    let talent = TalentsService::with_connection(&db)
        .create(&auth_of(&gtk), talent_request(TalentType::PembimbingLomba))
        .await
        .unwrap();

    let first = TalentsService::with_connection(&db);
    let second = TalentsService::with_connection(&db);
    let first_auth = auth_of(&first_admin);
    let second_auth = auth_of(&second_admin);
    let (a, b) = tokio::join!(
        first.approve(&first_auth, talent.id),
        second.approve(&second_auth, talent.id),
    );

    let (winner, loser) = match (a, b) {
        (Ok(winner), Err(loser)) | (Err(loser), Ok(winner)) => (winner, loser),
        (a, b) => panic!("expected exactly one winner, got {a:?} / {b:?}"),
    };
    assert!(matches!(loser.root(), AppError::AlreadyVerified));
    assert_eq!(winner.status, TalentStatus::Approved);
    assert!(
        [first_admin.id, second_admin.id].contains(&winner.verified_by.as_ref().unwrap().id)
    );

    let notified = notifications::Entity::find()
        .filter(notifications::Column::UserId.eq(gtk.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(notified, 1);
}
