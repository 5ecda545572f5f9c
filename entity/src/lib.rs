//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod enums;

pub mod notifications;
pub mod refresh_tokens;
pub mod schools;
pub mod talent_competition_mentors;
pub mod talent_competition_participants;
pub mod talent_interests;
pub mod talent_trainings;
pub mod talents;
pub mod users;

pub use notifications::Entity as Notifications;
pub use refresh_tokens::Entity as RefreshTokens;
pub use schools::Entity as Schools;
pub use talent_competition_mentors::Entity as TalentCompetitionMentors;
pub use talent_competition_participants::Entity as TalentCompetitionParticipants;
pub use talent_interests::Entity as TalentInterests;
pub use talent_trainings::Entity as TalentTrainings;
pub use talents::Entity as Talents;
pub use users::Entity as Users;

#[cfg(test)]
mod tests;
