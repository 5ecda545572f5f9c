//! # 学校与用户管理集成测试

use chrono::Utc;
use entity::enums::{GtkType, SchoolStatus, UserRole};
use entity::schools;
use pretty_assertions::assert_eq;
use sea_orm::{ActiveModelTrait, DbErr, EntityTrait, Set};

use sipodi::error::AppError;
use sipodi::error::conversion::unique_conflict;
use sipodi::management::services::schools::{
    CreateSchoolRequest, SchoolListQuery, SchoolsService, UpdateSchoolRequest,
};
use sipodi::management::services::users::{
    ChangePasswordRequest, CreateUserRequest, UpdateUserRequest, UserListQuery, UsersService,
};
use sipodi::testing::*;

fn school_request(npsn: &str) -> CreateSchoolRequest {
    CreateSchoolRequest {
        name: "SMP Negeri 1 Sumbawa".to_string(),
        npsn: npsn.to_string(),
        status: Some("negeri".to_string()),
        address: Some("Jl. Garuda No. 1".to_string()),
    }
}

fn gtk_request(email: &str, school_id: Option<uuid::Uuid>) -> CreateUserRequest {
    CreateUserRequest {
        email: email.to_string(),
        password: "rahasia123".to_string(),
        role: Some(UserRole::Gtk),
        full_name: "Siti Aminah".to_string(),
        gtk_type: Some(GtkType::Guru),
        school_id,
        ..CreateUserRequest::default()
    }
}

#[tokio::test]
async fn test_duplicate_npsn_is_conflict() {
    let app = TestApp::new().await.unwrap();
    let service = SchoolsService::new(&app.context);

    let created = service.create(school_request("12345")).await.unwrap();
    assert_eq!(created.npsn, "12345");
    assert_eq!(created.gtk_count, 0);

    let err = service.create(school_request("12345")).await.unwrap_err();
    match err.root() {
        AppError::Conflict { code, message } => {
            assert_eq!(*code, "DUPLICATE_NPSN");
            assert_eq!(message, "NPSN sudah terdaftar");
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_school_validates_fields() {
    let app = TestApp::new().await.unwrap();
    let err = SchoolsService::new(&app.context)
        .create(CreateSchoolRequest {
            status: Some("internasional".to_string()),
            ..CreateSchoolRequest::default()
        })
        .await
        .unwrap_err();
    let fields: Vec<&str> = err
        .field_errors()
        .unwrap()
        .iter()
        .map(|e| e.field.as_str())
        .collect();
    assert_eq!(fields, vec!["name", "npsn", "status", "address"]);
}

#[tokio::test]
async fn test_head_master_must_be_kepala_sekolah() {
    let app = TestApp::new().await.unwrap();
    let school = SchoolFixture::new().insert(app.db()).await.unwrap();
    let guru = UserFixture::gtk(school.id).insert(app.db()).await.unwrap();
    let principal = UserFixture::gtk(school.id)
        .gtk_type(GtkType::KepalaSekolah)
        .full_name("Drs. Hasan")
        .insert(app.db())
        .await
        .unwrap();
    let service = SchoolsService::new(&app.context);

    let err = service
        .update(
            school.id,
            UpdateSchoolRequest {
                head_master_id: Some(guru.id),
                ..UpdateSchoolRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err.root(), AppError::InvalidHeadMaster));

    let updated = service
        .update(
            school.id,
            UpdateSchoolRequest {
                head_master_id: Some(principal.id),
                ..UpdateSchoolRequest::default()
            },
        )
        .await
        .unwrap();
    let head_master = updated.head_master.unwrap();
    assert_eq!(head_master.id, principal.id);
    assert_eq!(head_master.full_name, "Drs. Hasan");
    assert_eq!(updated.gtk_count, 2);
}

#[tokio::test]
async fn test_school_with_users_cannot_be_deleted() {
    let app = TestApp::new().await.unwrap();
    let occupied = SchoolFixture::new().insert(app.db()).await.unwrap();
    UserFixture::gtk(occupied.id).insert(app.db()).await.unwrap();
    let empty = SchoolFixture::new().insert(app.db()).await.unwrap();
    let service = SchoolsService::new(&app.context);

    let err = service.delete(occupied.id).await.unwrap_err();
    assert!(matches!(err.root(), AppError::SchoolHasUsers));

    service.delete(empty.id).await.unwrap();
    assert!(
        schools::Entity::find_by_id(empty.id)
            .one(app.db())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_school_detail_visibility_and_counts() {
    let app = TestApp::new().await.unwrap();
    let school = SchoolFixture::new().insert(app.db()).await.unwrap();
    let other = SchoolFixture::new().insert(app.db()).await.unwrap();
    let gtk = UserFixture::gtk(school.id).insert(app.db()).await.unwrap();
    UserFixture::gtk(school.id)
        .gtk_type(GtkType::Tendik)
        .insert(app.db())
        .await
        .unwrap();
    let service = SchoolsService::new(&app.context);

    let detail = service.get(&auth_of(&gtk), school.id).await.unwrap();
    assert_eq!(detail.school.gtk_count, 2);
    assert_eq!(detail.guru_count, 1);
    assert_eq!(detail.tendik_count, 1);
    assert_eq!(detail.kepala_sekolah_count, 0);

    let err = service.get(&auth_of(&gtk), other.id).await.unwrap_err();
    assert!(matches!(err.root(), AppError::Forbidden { .. }));
}

#[tokio::test]
async fn test_school_list_search_and_users_scope() {
    let app = TestApp::new().await.unwrap();
    let sumbawa = SchoolFixture::new()
        .name("SMA Negeri 1 Sumbawa")
        .npsn("50200001")
        .insert(app.db())
        .await
        .unwrap();
    let mataram = SchoolFixture::new()
        .name("SMK Swasta Mataram")
        .npsn("50200002")
        .swasta()
        .insert(app.db())
        .await
        .unwrap();
    UserFixture::gtk(sumbawa.id).insert(app.db()).await.unwrap();
    let service = SchoolsService::new(&app.context);

    let page = service
        .list(&SchoolListQuery {
            search: Some("sumbawa".to_string()),
            ..SchoolListQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.items[0].id, sumbawa.id);

    let admin = UserFixture::school_admin(mataram.id)
        .insert(app.db())
        .await
        .unwrap();
    let err = service
        .get_users(&auth_of(&admin), sumbawa.id, UserListQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err.root(), AppError::Forbidden { .. }));

    let root = UserFixture::super_admin().insert(app.db()).await.unwrap();
    let members = service
        .get_users(&auth_of(&root), sumbawa.id, UserListQuery::default())
        .await
        .unwrap();
    assert_eq!(members.pagination.total, 1);
}

#[tokio::test]
async fn test_create_user_uniqueness() {
    let app = TestApp::new().await.unwrap();
    let root = UserFixture::super_admin().insert(app.db()).await.unwrap();
    let service = UsersService::new(&app.context);

    let created = service
        .create(&auth_of(&root), gtk_request("Siti@Sipodi.test", None))
        .await
        .unwrap();
    assert_eq!(created.email, "siti@sipodi.test");
    assert!(created.is_active);

    let err = service
        .create(&auth_of(&root), gtk_request("siti@sipodi.test", None))
        .await
        .unwrap_err();
    assert!(matches!(
        err.root(),
        AppError::Conflict {
            code: "EMAIL_TAKEN",
            ..
        }
    ));

    let mut with_nip = gtk_request("budi@sipodi.test", None);
    with_nip.nip = Some("198001012005011001".to_string());
    service.create(&auth_of(&root), with_nip).await.unwrap();
    let mut same_nip = gtk_request("citra@sipodi.test", None);
    same_nip.nip = Some("198001012005011001".to_string());
    let err = service
        .create(&auth_of(&root), same_nip)
        .await
        .unwrap_err();
    assert!(matches!(
        err.root(),
        AppError::Conflict {
            code: "NIP_TAKEN",
            ..
        }
    ));
}

#[tokio::test]
async fn test_school_admin_limits_on_user_creation() {
    let app = TestApp::new().await.unwrap();
    let school = SchoolFixture::new().insert(app.db()).await.unwrap();
    let other = SchoolFixture::new().insert(app.db()).await.unwrap();
    let admin = UserFixture::school_admin(school.id)
        .insert(app.db())
        .await
        .unwrap();
    let service = UsersService::new(&app.context);

    let mut promote = gtk_request("wakil@sipodi.test", Some(school.id));
    promote.role = Some(UserRole::AdminSekolah);
    let err = service
        .create(&auth_of(&admin), promote)
        .await
        .unwrap_err();
    assert!(matches!(err.root(), AppError::Forbidden { .. }));

    let err = service
        .create(&auth_of(&admin), gtk_request("luar@sipodi.test", Some(other.id)))
        .await
        .unwrap_err();
    assert!(matches!(err.root(), AppError::Forbidden { .. }));

    let created = service
        .create(&auth_of(&admin), gtk_request("guru@sipodi.test", Some(school.id)))
        .await
        .unwrap();
    assert_eq!(created.school.unwrap().id, school.id);

    let scoped = service
        .list(&auth_of(&admin), UserListQuery::default())
        .await
        .unwrap();
    assert!(scoped.items.iter().all(|u| u.school.as_ref().map(|s| s.id) == Some(school.id)));
}

#[tokio::test]
async fn test_self_delete_is_rejected_and_head_master_detached() {
    let app = TestApp::new().await.unwrap();
    let root = UserFixture::super_admin().insert(app.db()).await.unwrap();
    let school = SchoolFixture::new().insert(app.db()).await.unwrap();
    let principal = UserFixture::gtk(school.id)
        .gtk_type(GtkType::KepalaSekolah)
        .insert(app.db())
        .await
        .unwrap();
    SchoolsService::new(&app.context)
        .update(
            school.id,
            UpdateSchoolRequest {
                head_master_id: Some(principal.id),
                ..UpdateSchoolRequest::default()
            },
        )
        .await
        .unwrap();
    let service = UsersService::new(&app.context);

    let err = service.delete(&auth_of(&root), root.id).await.unwrap_err();
    assert!(matches!(err.root(), AppError::CannotDeleteSelf));

    service.delete(&auth_of(&root), principal.id).await.unwrap();
    let school = schools::Entity::find_by_id(school.id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert!(school.head_master_id.is_none());
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new().await.unwrap();
    let user = UserFixture::new().insert(app.db()).await.unwrap();
    let service = UsersService::new(&app.context);
    let auth = auth_of(&user);

    let err = service
        .change_password(
            &auth,
            &ChangePasswordRequest {
                current_password: DEFAULT_PASSWORD.to_string(),
                new_password: "passwordbaru".to_string(),
                new_password_confirmation: "passwordlain".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.field_errors().unwrap()[0].field,
        "new_password_confirmation"
    );

    let err = service
        .change_password(
            &auth,
            &ChangePasswordRequest {
                current_password: "bukan-password".to_string(),
                new_password: "passwordbaru".to_string(),
                new_password_confirmation: "passwordbaru".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err.root(), AppError::InvalidPassword));

    service
        .change_password(
            &auth,
            &ChangePasswordRequest {
                current_password: DEFAULT_PASSWORD.to_string(),
                new_password: "passwordbaru".to_string(),
                new_password_confirmation: "passwordbaru".to_string(),
            },
        )
        .await
        .unwrap();
    app.login(&user.email, "passwordbaru").await.unwrap();
}

fn conflict_code(err: &AppError) -> &'static str {
    match err.root() {
        AppError::Conflict { code, .. } => *code,
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unique_violations_map_to_conflict_codes() {
    let app = TestApp::new().await.unwrap();
    let school = SchoolFixture::new().npsn("20304050").insert(app.db()).await.unwrap();
    let user = UserFixture::gtk(school.id).insert(app.db()).await.unwrap();

    let now = Utc::now().naive_utc();
    let err = schools::ActiveModel {
        id: Set(uuid::Uuid::new_v4()),
        name: Set("SMA Negeri 2".to_string()),
        npsn: Set("20304050".to_string()),
        status: Set(SchoolStatus::Negeri),
        address: Set(None),
        head_master_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(app.db())
    .await
    .unwrap_err();
    assert_eq!(conflict_code(&unique_conflict(&err).unwrap()), "DUPLICATE_NPSN");

    let err = UserFixture::new()
        .email(&user.email)
        .to_active_model()
        .unwrap()
        .insert(app.db())
        .await
        .unwrap_err();
    assert_eq!(conflict_code(&unique_conflict(&err).unwrap()), "EMAIL_TAKEN");

    assert!(unique_conflict(&DbErr::RecordNotFound("user".to_string())).is_none());
}

#[tokio::test]
async fn test_concurrent_school_creation_with_same_npsn() {
    let (app, _dir) = TestApp::with_temp_db().await.unwrap();
    let first = SchoolsService::new(&app.context);
    let second = SchoolsService::new(&app.context);

    let (a, b) = tokio::join!(
        first.create(school_request("55667788")),
        second.create(school_request("55667788")),
    );
    let err = match (a, b) {
        (Ok(_), Err(err)) | (Err(err), Ok(_)) => err,
        (a, b) => panic!("expected exactly one school, got {a:?} / {b:?}"),
    };
    assert_eq!(conflict_code(&err), "DUPLICATE_NPSN");
    assert_eq!(schools::Entity::find().all(app.db()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_demoted_head_master_is_detached() {
    let app = TestApp::new().await.unwrap();
    let root = UserFixture::super_admin().insert(app.db()).await.unwrap();
    let school = SchoolFixture::new().insert(app.db()).await.unwrap();
    let principal = UserFixture::gtk(school.id)
        .gtk_type(GtkType::KepalaSekolah)
        .insert(app.db())
        .await
        .unwrap();
    let schools_service = SchoolsService::new(&app.context);
    schools_service
        .update(
            school.id,
            UpdateSchoolRequest {
                head_master_id: Some(principal.id),
                ..UpdateSchoolRequest::default()
            },
        )
        .await
        .unwrap();
    let users_service = UsersService::new(&app.context);

    // 其它字段的修改不影响校长关联
    users_service
        .update(
            &auth_of(&root),
            principal.id,
            UpdateUserRequest {
                full_name: Some("Dra. Wulandari".to_string()),
                gtk_type: Some(GtkType::KepalaSekolah),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();
    let detail = schools_service.get(&auth_of(&root), school.id).await.unwrap();
    assert_eq!(detail.school.head_master.map(|h| h.id), Some(principal.id));

    let updated = users_service
        .update(
            &auth_of(&root),
            principal.id,
            UpdateUserRequest {
                gtk_type: Some(GtkType::Guru),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.gtk_type, Some(GtkType::Guru));

    let school = schools::Entity::find_by_id(school.id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert!(school.head_master_id.is_none());
}

#[tokio::test]
async fn test_head_master_moved_to_other_school_is_detached() {
    let app = TestApp::new().await.unwrap();
    let root = UserFixture::super_admin().insert(app.db()).await.unwrap();
    let origin = SchoolFixture::new().insert(app.db()).await.unwrap();
    let target = SchoolFixture::new().insert(app.db()).await.unwrap();
    let principal = UserFixture::gtk(origin.id)
        .gtk_type(GtkType::KepalaSekolah)
        .insert(app.db())
        .await
        .unwrap();
    SchoolsService::new(&app.context)
        .update(
            origin.id,
            UpdateSchoolRequest {
                head_master_id: Some(principal.id),
                ..UpdateSchoolRequest::default()
            },
        )
        .await
        .unwrap();

    UsersService::new(&app.context)
        .update(
            &auth_of(&root),
            principal.id,
            UpdateUserRequest {
                school_id: Some(target.id),
                ..UpdateUserRequest::default()
            },
        )
        .await
        .unwrap();

    let origin = schools::Entity::find_by_id(origin.id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert!(origin.head_master_id.is_none());
}
