//! # 管理端服务层
//!
//! 聚合各业务域的逻辑，供 HTTP handler 与集成测试复用。
//! 服务按请求构造，只借用 `AppContext` 中的共享组件。

pub mod dashboard;
pub mod notifications;
pub mod schools;
pub mod shared;
pub mod talents;
pub mod uploads;
pub mod users;

pub use dashboard::{DashboardService, DashboardSummary};
pub use notifications::{NotificationListQuery, NotificationsService};
pub use schools::{CreateSchoolRequest, SchoolListQuery, SchoolsService, UpdateSchoolRequest};
pub use talents::{
    BatchApproveRequest, BatchRejectRequest, BatchResult, CreateTalentRequest,
    RejectTalentRequest, TalentDetail, TalentListQuery, TalentsService, UpdateTalentRequest,
};
pub use uploads::{PresignRequest, UploadService};
pub use users::{
    ChangePasswordRequest, CreateUserRequest, UpdateProfileRequest, UpdateUserRequest,
    UserListQuery, UsersService,
};

pub use shared::{Page, PaginationInfo, PaginationParams, build_page};
