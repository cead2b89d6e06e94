pub mod shared {
    pub mod bounding_box;
    pub mod constants;
    pub mod detection;
    pub mod frame;
}

pub mod tracking {
    pub mod domain {
        pub mod face_id;
        pub mod face_tracker;
        pub mod velocity;
    }
    pub mod infrastructure;
}

pub mod narration {
    pub mod domain {
        pub mod phrase_catalog;
        pub mod phrase_selector;
        pub mod selection_history;
        pub mod speed_category;
    }
    pub mod infrastructure;
}

pub mod playback {
    pub mod domain {
        pub mod audio_player;
        pub mod phrase_display;
        pub mod playback_event;
        pub mod remote_phrases;
        pub mod sequencer_state;
    }
    pub mod infrastructure;
    pub mod playback_sequencer;
}

pub mod session {
    pub mod face_annotation;
    pub mod narration_session;
    pub mod session_config;
    pub mod session_factory;
    pub mod session_logger;
}
