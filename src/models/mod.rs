pub mod captcha;
pub mod case;

pub use captcha::CaptchaChallenge;
pub use case::{CaseRecord, CrawlRecord, FetchOutcome};
