use biometrics::{Collector, Counter, Moments};

pub(crate) static CHAT_REQUESTS: Counter = Counter::new("termassist.chat.requests");
pub(crate) static CHAT_REQUEST_ERRORS: Counter = Counter::new("termassist.chat.request_errors");
pub(crate) static CHAT_EMPTY_REPLIES: Counter = Counter::new("termassist.chat.empty_replies");
pub(crate) static CHAT_REQUEST_DURATION: Moments =
    Moments::new("termassist.chat.request_duration_seconds");

pub(crate) static IMAGE_REQUESTS: Counter = Counter::new("termassist.image.requests");
pub(crate) static IMAGE_REQUEST_ERRORS: Counter = Counter::new("termassist.image.request_errors");
pub(crate) static IMAGE_REQUEST_DURATION: Moments =
    Moments::new("termassist.image.request_duration_seconds");

pub(crate) static HISTORY_SAVES: Counter = Counter::new("termassist.history.saves");
pub(crate) static HISTORY_SAVE_SKIPPED: Counter = Counter::new("termassist.history.save_skipped");
pub(crate) static HISTORY_SAVE_ERRORS: Counter = Counter::new("termassist.history.save_errors");
pub(crate) static HISTORY_SUPERSEDED: Counter = Counter::new("termassist.history.superseded");
pub(crate) static HISTORY_RESUMES: Counter = Counter::new("termassist.history.resumes");
pub(crate) static HISTORY_RESUME_ERRORS: Counter =
    Counter::new("termassist.history.resume_errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CHAT_REQUESTS);
    collector.register_counter(&CHAT_REQUEST_ERRORS);
    collector.register_counter(&CHAT_EMPTY_REPLIES);
    collector.register_moments(&CHAT_REQUEST_DURATION);

    collector.register_counter(&IMAGE_REQUESTS);
    collector.register_counter(&IMAGE_REQUEST_ERRORS);
    collector.register_moments(&IMAGE_REQUEST_DURATION);

    collector.register_counter(&HISTORY_SAVES);
    collector.register_counter(&HISTORY_SAVE_SKIPPED);
    collector.register_counter(&HISTORY_SAVE_ERRORS);
    collector.register_counter(&HISTORY_SUPERSEDED);
    collector.register_counter(&HISTORY_RESUMES);
    collector.register_counter(&HISTORY_RESUME_ERRORS);
}
