//! The emulation core façade: drives one emulated frame per resume cycle,
//! merging input sources, stepping the attached core, and compositing the
//! render queue onto the result.
//!
//! The emulated console, the display sink, and the audio sink are named
//! out-of-scope collaborators (§6): this module only depends on the traits
//! they must satisfy, mirroring the teacher's `Support` trait seam (one
//! associated-type trait per external concern, rather than one god trait).

use std::collections::HashMap;

use tascore_media::{Frame, Queue};

use crate::error::{Error, Result};
use crate::input::PortTypeSet;

/// The console core being driven: consumes a packed controller frame, runs
/// exactly one emulated frame, and reports whether it polled input.
pub trait EmulatedCore {
    /// Resets the emulated console to its power-on state.
    fn reset(&mut self);

    /// Steps one emulated frame given `input`'s packed controller bytes.
    ///
    /// Returns the raw framebuffer and a linear PCM audio slice.
    fn step(&mut self, input: &[u8]) -> (Vec<u32>, Vec<i16>);

    /// Whether the frame just stepped included at least one non-silenced
    /// input poll (used to decide whether to advance the frame counter).
    fn polled(&self) -> bool;

    /// Captures the core's internal state for a savestate.
    fn save_state(&self) -> Vec<u8>;

    /// Restores internal state previously returned by [`Self::save_state`].
    fn load_state(&mut self, bytes: &[u8]);
}

/// Receives composited frames for presentation.
pub trait DisplaySink {
    fn present(&mut self, frame: &Frame<'_>);
}

/// Receives raw audio slices for playback.
pub trait AudioSink {
    fn submit(&mut self, slice: &[i16]);
}

/// How the façade advances frames in response to UI commands.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FrameAdvanceMode {
    /// Runs continuously.
    #[default]
    FreeRun,
    /// Steps exactly one frame, then returns to [`Self::Pause`].
    AdvanceFrame,
    /// Steps until the next input poll, then returns to [`Self::Pause`].
    AdvanceSubframe,
    /// Does not step at all.
    Pause,
}

/// Per-`(port, controller, button)` autohold/autofire state.
#[derive(Clone, Copy, Debug, Default)]
pub struct ButtonOverride {
    /// Forces the button held for as long as this is `true`.
    pub autohold: bool,
    /// `(duty, cycle_length)`: asserted on frames where
    /// `frame_index % cycle_length < duty`.
    pub autofire: Option<(u32, u32)>,
}

impl ButtonOverride {
    /// Whether this override asserts the button on `frame_index`.
    #[must_use]
    pub fn active_on(&self, frame_index: u64) -> bool {
        if self.autohold {
            return true;
        }
        match self.autofire {
            Some((duty, cycle)) if cycle > 0 => (frame_index % u64::from(cycle)) < u64::from(duty),
            _ => false,
        }
    }
}

/// A `(port, controller, button)` triple addressing one autohold/autofire
/// slot.
pub type ButtonKey = (usize, usize, usize);

/// A scripted callback invoked once per frame boundary.
pub type FrameCallback = Box<dyn FnMut(&mut [i32])>;

/// A scripted callback invoked with the scaled framebuffer and an empty
/// render queue to draw into.
pub type PaintCallback = Box<dyn FnMut(&Frame<'_>, &mut Queue)>;

/// Drives the attached [`EmulatedCore`] one frame per [`Self::step`] call,
/// merging input sources in priority order and compositing the render
/// queue onto the result before publishing it.
pub struct Facade<C, D, A> {
    core: C,
    display: D,
    audio: A,
    ports: PortTypeSet,
    mode: FrameAdvanceMode,
    overrides: HashMap<ButtonKey, ButtonOverride>,
    on_input: Option<FrameCallback>,
    on_paint: Option<PaintCallback>,
    on_video: Option<PaintCallback>,
    queue: Queue,
    frame_index: u64,
}

impl<C: EmulatedCore, D: DisplaySink, A: AudioSink> Facade<C, D, A> {
    /// Constructs a façade driving `core`, publishing frames to `display`
    /// and audio to `audio`.
    pub fn new(core: C, display: D, audio: A, ports: PortTypeSet) -> Self {
        Self {
            core,
            display,
            audio,
            ports,
            mode: FrameAdvanceMode::default(),
            overrides: HashMap::new(),
            on_input: None,
            on_paint: None,
            on_video: None,
            queue: Queue::new(),
            frame_index: 0,
        }
    }

    /// Sets the frame-advance mode, as driven by a UI command.
    pub fn set_mode(&mut self, mode: FrameAdvanceMode) {
        self.mode = mode;
    }

    /// The number of frames committed to the current branch so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Sets or clears the autohold/autofire override for one button.
    pub fn set_override(&mut self, key: ButtonKey, over: ButtonOverride) {
        self.overrides.insert(key, over);
    }

    /// Installs the `on_input` scripted callback.
    pub fn set_on_input(&mut self, cb: FrameCallback) {
        self.on_input = Some(cb);
    }

    /// Installs the `on_paint` scripted callback.
    pub fn set_on_paint(&mut self, cb: PaintCallback) {
        self.on_paint = Some(cb);
    }

    /// Installs the `on_video` scripted callback.
    pub fn set_on_video(&mut self, cb: PaintCallback) {
        self.on_video = Some(cb);
    }

    /// Merges one controller frame's samples from, in priority order:
    /// recorded movie input, autofire, autohold, then live UI input —
    /// earlier sources win once they assert a non-default sample.
    fn merge_input(&self, recorded: &[i32], live: &[i32]) -> Vec<i32> {
        let mut merged = recorded.to_vec();
        let mut idx = 0usize;
        for (port_idx, port) in self.ports.ports().iter().enumerate() {
            for button_idx in 0..port.controller.buttons.len() {
                let key = (port_idx, 0, button_idx);
                if let Some(over) = self.overrides.get(&key) {
                    if over.active_on(self.frame_index) {
                        merged[idx] = 1;
                    }
                }
                if merged[idx] == 0 {
                    if let Some(&value) = live.get(idx) {
                        if value != 0 {
                            merged[idx] = value;
                        }
                    }
                }
                idx += 1;
            }
        }
        merged
    }

    /// Runs one resume cycle per §4.13: merges input, steps the core,
    /// conditionally advances the frame counter, runs scripted paint/video
    /// callbacks and the render queue, and publishes the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if [`FrameAdvanceMode::Pause`] is
    /// active.
    pub fn step(&mut self, recorded: &[i32], live: &[i32]) -> Result<()> {
        if self.mode == FrameAdvanceMode::Pause {
            return Err(Error::InvalidState("facade is paused".into()));
        }

        let mut samples = self.merge_input(recorded, live);
        if let Some(cb) = &mut self.on_input {
            cb(&mut samples);
        }
        let packed = self.ports.encode_frame(&samples);

        let (raw, audio) = self.core.step(&packed);
        if self.core.polled() {
            self.frame_index += 1;
        }

        let width = 160;
        let height = (raw.len() / width.max(1)).max(1);
        let mut frame = Frame::new(width, height);
        let len = frame.as_slice().len().min(raw.len());
        for row in 0..height {
            let start = row * width;
            let end = (start + width).min(len);
            if start >= end {
                break;
            }
            frame.rowptr_mut(row)[..end - start].copy_from_slice(&raw[start..end]);
        }

        if let Some(cb) = &mut self.on_paint {
            cb(&frame, &mut self.queue);
        }
        if let Some(cb) = &mut self.on_video {
            cb(&frame, &mut self.queue);
        }
        self.queue.run(&mut frame);

        self.display.present(&frame);
        self.audio.submit(&audio);

        if self.mode == FrameAdvanceMode::AdvanceFrame {
            self.mode = FrameAdvanceMode::Pause;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ButtonSpec, ControllerType, PortType};

    struct StubCore {
        polled: bool,
    }
    impl EmulatedCore for StubCore {
        fn reset(&mut self) {}
        fn step(&mut self, _input: &[u8]) -> (Vec<u32>, Vec<i16>) {
            (vec![0u32; 160 * 144], vec![0i16; 8])
        }
        fn polled(&self) -> bool {
            self.polled
        }
        fn save_state(&self) -> Vec<u8> {
            Vec::new()
        }
        fn load_state(&mut self, _bytes: &[u8]) {}
    }

    #[derive(Default)]
    struct StubDisplay {
        frames: u32,
    }
    impl DisplaySink for StubDisplay {
        fn present(&mut self, _frame: &Frame<'_>) {
            self.frames += 1;
        }
    }

    #[derive(Default)]
    struct StubAudio;
    impl AudioSink for StubAudio {
        fn submit(&mut self, _slice: &[i16]) {}
    }

    fn ports() -> PortTypeSet {
        let controller = ControllerType::new("pad", vec![ButtonSpec::button("A")]);
        PortTypeSet::new(vec![PortType { name: "1".into(), controller }])
    }

    #[test]
    fn step_advances_frame_counter_on_poll() {
        let mut facade = Facade::new(StubCore { polled: true }, StubDisplay::default(), StubAudio, ports());
        facade.step(&[0], &[0]).unwrap();
        assert_eq!(facade.frame_index(), 1);
    }

    #[test]
    fn pause_mode_rejects_step() {
        let mut facade = Facade::new(StubCore { polled: true }, StubDisplay::default(), StubAudio, ports());
        facade.set_mode(FrameAdvanceMode::Pause);
        assert!(facade.step(&[0], &[0]).is_err());
    }

    #[test]
    fn advance_frame_mode_pauses_after_one_step() {
        let mut facade = Facade::new(StubCore { polled: true }, StubDisplay::default(), StubAudio, ports());
        facade.set_mode(FrameAdvanceMode::AdvanceFrame);
        facade.step(&[0], &[0]).unwrap();
        assert!(facade.step(&[0], &[0]).is_err());
    }

    #[test]
    fn autohold_override_forces_button() {
        let mut facade = Facade::new(StubCore { polled: true }, StubDisplay::default(), StubAudio, ports());
        facade.set_override((0, 0, 0), ButtonOverride { autohold: true, autofire: None });
        let merged = facade.merge_input(&[0], &[0]);
        assert_eq!(merged, vec![1]);
    }

    #[test]
    fn autofire_asserts_on_duty_cycle_frames() {
        let over = ButtonOverride { autohold: false, autofire: Some((1, 2)) };
        assert!(over.active_on(0));
        assert!(!over.active_on(1));
        assert!(over.active_on(2));
    }
}
