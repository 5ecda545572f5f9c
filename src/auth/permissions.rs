//! # 访问控制策略
//!
//! 角色与学校范围的判定集中在这里，服务层在读取目标数据后调用。

use entity::enums::UserRole;
use uuid::Uuid;

use crate::auth::types::AuthContext;
use crate::error::{AppError, Result};

/// 中间件角色拒绝时的提示
pub const ROLE_DENIED_MESSAGE: &str = "Anda tidak memiliki akses ke resource ini";

/// 路由级角色集合
pub const SUPER_ADMIN_ONLY: &[UserRole] = &[UserRole::SuperAdmin];
pub const ADMINS: &[UserRole] = &[UserRole::SuperAdmin, UserRole::AdminSekolah];
pub const GTK_ONLY: &[UserRole] = &[UserRole::Gtk];

/// 角色是否在允许集合内
#[must_use]
pub fn role_allowed(role: UserRole, allowed: &[UserRole]) -> bool {
    allowed.contains(&role)
}

/// 调用者是否可以管理属于 `school_id` 的数据
///
/// 超级管理员不受限；学校管理员必须有学校且与目标一致；GTK 一律不可。
#[must_use]
pub fn within_school_scope(ctx: &AuthContext, school_id: Option<Uuid>) -> bool {
    match ctx.role {
        UserRole::SuperAdmin => true,
        UserRole::AdminSekolah => ctx.school_id.is_some() && ctx.school_id == school_id,
        UserRole::Gtk => false,
    }
}

/// 学校范围检查，失败返回 `Forbidden(message)`
pub fn ensure_school_scope(
    ctx: &AuthContext,
    school_id: Option<Uuid>,
    message: &str,
) -> Result<()> {
    if within_school_scope(ctx, school_id) {
        Ok(())
    } else {
        Err(AppError::forbidden(message))
    }
}

/// 审核人才：管理员且人才所有者在其范围内
pub fn ensure_can_verify(ctx: &AuthContext, owner_school_id: Option<Uuid>) -> Result<()> {
    ensure_school_scope(
        ctx,
        owner_school_id,
        "Anda hanya dapat memverifikasi talenta GTK di sekolah Anda",
    )
}

/// 查看人才：本人、超级管理员或同校管理员
pub fn ensure_can_read_talent(
    ctx: &AuthContext,
    owner_id: Uuid,
    owner_school_id: Option<Uuid>,
) -> Result<()> {
    if ctx.user_id == owner_id {
        return Ok(());
    }
    ensure_school_scope(
        ctx,
        owner_school_id,
        "Anda tidak memiliki akses ke talenta ini",
    )
}

/// 修改或删除人才：仅所有者
pub fn ensure_talent_owner(ctx: &AuthContext, owner_id: Uuid, message: &str) -> Result<()> {
    if ctx.user_id == owner_id {
        Ok(())
    } else {
        Err(AppError::forbidden(message))
    }
}

/// 查看用户：本人、超级管理员或同校管理员
pub fn ensure_can_read_user(
    ctx: &AuthContext,
    target_id: Uuid,
    target_school_id: Option<Uuid>,
) -> Result<()> {
    if ctx.user_id == target_id {
        return Ok(());
    }
    ensure_school_scope(
        ctx,
        target_school_id,
        "Anda tidak memiliki akses ke user ini",
    )
}

/// 创建或修改用户时，学校管理员只能分配 GTK 角色
pub fn ensure_assignable_role(ctx: &AuthContext, role: UserRole) -> Result<()> {
    if ctx.is_super_admin() || role == UserRole::Gtk {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "Anda hanya dapat menambah user dengan role GTK",
        ))
    }
}

/// 禁止删除自己
pub fn ensure_not_self(ctx: &AuthContext, target_id: Uuid) -> Result<()> {
    if ctx.user_id == target_id {
        Err(AppError::CannotDeleteSelf)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ctx(role: UserRole, school_id: Option<Uuid>) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            email: "user@sipodi.id".to_string(),
            role,
            school_id,
        }
    }

    #[rstest]
    #[case(UserRole::SuperAdmin, SUPER_ADMIN_ONLY, true)]
    #[case(UserRole::AdminSekolah, SUPER_ADMIN_ONLY, false)]
    #[case(UserRole::AdminSekolah, ADMINS, true)]
    #[case(UserRole::Gtk, ADMINS, false)]
    #[case(UserRole::Gtk, GTK_ONLY, true)]
    #[case(UserRole::SuperAdmin, GTK_ONLY, false)]
    fn test_role_allowed(#[case] role: UserRole, #[case] allowed: &[UserRole], #[case] ok: bool) {
        assert_eq!(role_allowed(role, allowed), ok);
    }

    #[test]
    fn test_school_scope() {
        let school = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(within_school_scope(&ctx(UserRole::SuperAdmin, None), Some(other)));
        assert!(within_school_scope(&ctx(UserRole::AdminSekolah, Some(school)), Some(school)));
        assert!(!within_school_scope(&ctx(UserRole::AdminSekolah, Some(school)), Some(other)));
        assert!(!within_school_scope(&ctx(UserRole::AdminSekolah, Some(school)), None));
        // 没有学校的管理员没有任何范围
        assert!(!within_school_scope(&ctx(UserRole::AdminSekolah, None), None));
        assert!(!within_school_scope(&ctx(UserRole::Gtk, Some(school)), Some(school)));
    }

    #[test]
    fn test_verify_scope_is_forbidden_outside_school() {
        let admin = ctx(UserRole::AdminSekolah, Some(Uuid::new_v4()));
        let err = ensure_can_verify(&admin, Some(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[test]
    fn test_owner_can_read_own_talent() {
        let gtk = ctx(UserRole::Gtk, Some(Uuid::new_v4()));
        assert!(ensure_can_read_talent(&gtk, gtk.user_id, gtk.school_id).is_ok());
        assert!(ensure_can_read_talent(&gtk, Uuid::new_v4(), gtk.school_id).is_err());
    }

    #[test]
    fn test_school_admin_cannot_assign_admin_roles() {
        let admin = ctx(UserRole::AdminSekolah, Some(Uuid::new_v4()));
        assert!(ensure_assignable_role(&admin, UserRole::Gtk).is_ok());
        assert!(ensure_assignable_role(&admin, UserRole::AdminSekolah).is_err());
        assert!(ensure_assignable_role(&ctx(UserRole::SuperAdmin, None), UserRole::SuperAdmin).is_ok());
    }

    #[test]
    fn test_self_delete_rejected() {
        let admin = ctx(UserRole::SuperAdmin, None);
        assert!(matches!(
            ensure_not_self(&admin, admin.user_id),
            Err(AppError::CannotDeleteSelf)
        ));
        assert!(ensure_not_self(&admin, Uuid::new_v4()).is_ok());
    }
}
