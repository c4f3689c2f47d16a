use std::num::NonZeroIsize;

use raw_window_handle::{RawWindowHandle, Win32WindowHandle};
use text_rpg::backend::{Call, HeadlessBackend, HeadlessFactory, ObjectKind, Recording};
use text_rpg::config::DialogueStyle;
use text_rpg::contents::tutorial::TUTORIAL_LINES;
use text_rpg::contents::{parse_contents, ContentsManager};
use text_rpg::core::WinitController;
use text_rpg::traits::{Button, Game};
use text_rpg::types::{Extent, FontDesc};
use text_rpg::{FailurePolicy, Pipeline, TextAdventure, WindowMessage};
use winit::event::ElementState;

fn window() -> RawWindowHandle {
    RawWindowHandle::Win32(Win32WindowHandle::new(NonZeroIsize::new(0x1234).unwrap()))
}

struct Session {
    pipeline: Pipeline<HeadlessFactory>,
    game: TextAdventure<HeadlessBackend>,
    controller: WinitController,
    recording: Recording,
}

impl Session {
    fn start() -> Self {
        Self::start_with(Recording::new())
    }

    fn start_with(recording: Recording) -> Self {
        let factory = HeadlessFactory::with_recording(recording.clone());
        let mut pipeline = Pipeline::new(factory, FailurePolicy::Strict);
        pipeline.dispatch(window(), WindowMessage::Create).unwrap();
        pipeline
            .dispatch(window(), WindowMessage::Size(Extent::new(800, 600)))
            .unwrap();

        let story = parse_contents("cave,It is dark.\ncave,Water drips.\n", ',').unwrap();
        let contents = ContentsManager::new(story, Some(3)).unwrap();
        let mut game = TextAdventure::new(contents, FontDesc::default(), DialogueStyle::default());
        game.start(pipeline.renderer().unwrap()).unwrap();

        Self {
            pipeline,
            game,
            controller: WinitController::new(),
            recording,
        }
    }

    fn frame(&mut self) {
        self.game
            .update(&self.controller, self.pipeline.renderer().unwrap())
            .unwrap();
        self.pipeline
            .dispatch(window(), WindowMessage::Present)
            .unwrap();
        self.controller.end_frame();
    }

    fn tap(&mut self, button: Button) {
        self.controller
            .set_state(button, ElementState::Pressed, false);
        self.frame();
        self.controller
            .set_state(button, ElementState::Released, false);
    }

    fn last_text(&self) -> Option<String> {
        self.recording
            .calls()
            .iter()
            .rev()
            .find_map(|c| match c {
                Call::DrawText { text, .. } => Some(text.clone()),
                _ => None,
            })
    }

    fn stop(mut self) -> Recording {
        self.game.end(self.pipeline.renderer().unwrap());
        self.pipeline
            .dispatch(window(), WindowMessage::Destroy)
            .unwrap();
        self.recording
    }
}

#[test]
fn test_start_creates_font_and_panel() {
    let session = Session::start();
    assert_eq!(session.recording.live_of(ObjectKind::Font), 1);
    assert_eq!(session.recording.live_of(ObjectKind::Texture), 1);

    // view is identity
    let view = session.recording.constant_slot_contents(1).unwrap();
    let columns = glam::Mat4::IDENTITY.to_cols_array();
    let identity: Vec<u8> = bytemuck::cast_slice::<f32, u8>(columns.as_slice()).to_vec();
    assert_eq!(view, identity);
    session.stop();
}

#[test]
fn test_frame_draws_panel_then_current_line() {
    let mut session = Session::start();
    session.recording.clear_calls();
    session.frame();

    let calls = session.recording.calls();
    let draw = calls
        .iter()
        .position(|c| matches!(c, Call::Draw { .. }))
        .unwrap();
    let text = calls
        .iter()
        .position(|c| matches!(c, Call::DrawText { .. }))
        .unwrap();
    let present = calls
        .iter()
        .position(|c| matches!(c, Call::Present { .. }))
        .unwrap();

    assert!(draw < text && text < present);
    assert_eq!(session.last_text().as_deref(), Some(TUTORIAL_LINES[0]));
    session.stop();
}

#[test]
fn test_next_and_back_keys_page_dialogue() {
    let mut session = Session::start();

    session.tap(Button::Next);
    assert_eq!(session.last_text().as_deref(), Some(TUTORIAL_LINES[1]));

    // held key does not repeat
    session.controller
        .set_state(Button::Next, ElementState::Pressed, false);
    session.frame();
    session.frame();
    assert_eq!(session.game.contents().index(), 2);

    session.controller
        .set_state(Button::Next, ElementState::Released, false);
    session.tap(Button::Back);
    assert_eq!(session.last_text().as_deref(), Some(TUTORIAL_LINES[1]));
    session.stop();
}

#[test]
fn test_session_teardown_leaks_nothing() {
    let mut session = Session::start();
    for _ in 0..5 {
        session.tap(Button::Next);
    }
    session
        .pipeline
        .dispatch(window(), WindowMessage::Size(Extent::new(1024, 768)))
        .unwrap();
    session.frame();

    let recording = session.stop();
    assert_eq!(recording.live_objects(), 0, "{:?}", recording.report_live_objects());
}

#[test]
fn test_resize_updates_projection() {
    let mut session = Session::start();
    let before = session.recording.constant_slot_contents(2).unwrap();

    session
        .pipeline
        .dispatch(window(), WindowMessage::Size(Extent::new(1024, 768)))
        .unwrap();
    session.frame();

    let after = session.recording.constant_slot_contents(2).unwrap();
    assert_ne!(before, after);
    session.stop();
}

#[test]
fn test_unlogged_session_stays_bounded_across_frames() {
    let mut session = Session::start_with(Recording::without_log());
    for frame in 0..500 {
        if frame % 7 == 0 {
            session.tap(Button::Next);
        } else {
            session.frame();
        }
    }

    assert!(session.recording.calls().is_empty());
    assert_eq!(session.recording.live_of(ObjectKind::TargetView), 1);
    assert_eq!(session.recording.live_of(ObjectKind::Texture), 1);

    let recording = session.stop();
    assert_eq!(recording.live_objects(), 0, "{:?}", recording.report_live_objects());
}
