pub mod http_remote_phrase_service;
pub mod log_phrase_display;
pub mod snapshot_capture;
pub mod threaded_batch_requester;
pub mod timed_audio_player;
