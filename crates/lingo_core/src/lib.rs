pub mod accounts;
pub mod domain;
pub mod error;
pub mod medals;
pub mod ports;
pub mod progress;
pub mod quiz;
pub mod ranking;
pub mod scenarios;
pub mod streak;

pub use domain::{
    AuthSession, ChatRole, ChatTurn, ConversationRecord, FriendBoard, LeaderboardEntry,
    MemberProgress, NewConversation, Progress, StreakDay, User, UserCredentials, VocabularyWord,
    WordProgress,
};
pub use error::{CoreError, CoreResult, FriendRejection};
pub use ports::{PortError, PortResult, QuizGenerationService, RecordStore, TutorService};
pub use progress::ProgressAggregator;
pub use ranking::FriendRanking;
pub use streak::StreakCalendar;
