pub mod client;
pub mod error;
pub mod types;

pub use client::{HttpTwitterClient, SocialClient};
pub use error::TwitterError;
pub use types::{FetchedMention, MentionBatch, PostedReply, RateLimitInfo};
