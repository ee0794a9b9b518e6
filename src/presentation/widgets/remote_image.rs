//! Remote image shell widget.
//!
//! The externally visible component of the pipeline: a pure function of the
//! current [`ResolutionState`] to rendered output, plus the per-instance
//! bookkeeping that makes cancellation safe. Each instance tags its pipeline
//! runs with a generation counter; updates carrying a stale generation are
//! discarded, and any handle they carry is revoked on arrival.

use std::sync::Arc;

use crossterm::event::Event;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph, StatefulWidget, Widget};
use ratatui_image::StatefulImage;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;

use crate::application::engine::PipelineOutcome;
use crate::application::engine::events::PipelineEvent;
use crate::domain::entities::{Generation, HandleSlot, ResolutionState, ResolvedVia};

/// Maximum rendered height of one image, in terminal rows.
pub const MAX_IMAGE_HEIGHT: u16 = 20;

/// One generation-tagged message from a pipeline run to its shell.
#[derive(Debug)]
pub enum ShellUpdate {
    /// An intermediate diagnostic event.
    Event(Generation, PipelineEvent),
    /// The terminal outcome of the run.
    Outcome(Generation, PipelineOutcome),
}

/// Presentation shell for one remote image reference.
pub struct RemoteImage {
    reference: String,
    fallback_reference: Option<String>,
    fallback_alt: String,
    generation: Generation,
    state: ResolutionState,
    image: Option<Arc<image::DynamicImage>>,
    protocol: Option<StatefulProtocol>,
    slot: HandleSlot,
    stale_discards: u64,
    resolving_fallback: bool,
    resolved_index: Option<usize>,
    resume_index: usize,
}

impl RemoteImage {
    /// Creates a shell for the given reference. An empty reference lands in
    /// the placeholder state immediately, without a pipeline run.
    #[must_use]
    pub fn new(reference: impl Into<String>, fallback_alt: impl Into<String>) -> Self {
        let mut shell = Self {
            reference: String::new(),
            fallback_reference: None,
            fallback_alt: fallback_alt.into(),
            generation: 0,
            state: ResolutionState::Idle,
            image: None,
            protocol: None,
            slot: HandleSlot::new(),
            stale_discards: 0,
            resolving_fallback: false,
            resolved_index: None,
            resume_index: 0,
        };
        shell.set_reference(reference);
        shell
    }

    /// Sets a secondary reference resolved when the primary one ends in the
    /// placeholder state. The alt text remains the last resort.
    #[must_use]
    pub fn with_fallback_reference(mut self, reference: impl Into<String>) -> Self {
        self.fallback_reference = Some(reference.into());
        self
    }

    /// Replaces the source reference and restarts the pipeline state.
    ///
    /// Everything derived from the previous reference is discarded: the
    /// displayed image, the render protocol, and any live resource handle.
    /// Returns the new generation; the caller tags the next `resolve` run
    /// with it so late completions from the old run can be told apart.
    pub fn set_reference(&mut self, reference: impl Into<String>) -> Generation {
        self.reference = reference.into();
        self.generation += 1;
        self.image = None;
        self.protocol = None;
        self.slot.revoke();
        self.resolving_fallback = false;
        self.resolved_index = None;
        self.resume_index = 0;

        self.state = if self.reference.trim().is_empty() {
            ResolutionState::Fallback
        } else {
            ResolutionState::Classifying
        };
        self.generation
    }

    /// Returns the current reference.
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Returns the reference the next pipeline run should resolve: the
    /// primary one, or the fallback reference once the primary is spent.
    #[must_use]
    pub fn resolution_target(&self) -> &str {
        if self.resolving_fallback {
            self.fallback_reference.as_deref().unwrap_or(&self.reference)
        } else {
            &self.reference
        }
    }

    /// Candidate index the next pipeline run should start from. Non-zero
    /// after a resolved display source died post-attach.
    #[must_use]
    pub const fn resume_index(&self) -> usize {
        self.resume_index
    }

    /// Returns the generation of the current pipeline run.
    #[must_use]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns the current display state.
    #[must_use]
    pub const fn state(&self) -> &ResolutionState {
        &self.state
    }

    /// Returns true if a pipeline run should be started for this shell.
    #[must_use]
    pub const fn needs_resolution(&self) -> bool {
        matches!(self.state, ResolutionState::Classifying)
    }

    /// Applies one update from a pipeline run, routing by generation.
    pub fn apply(&mut self, update: ShellUpdate) {
        match update {
            ShellUpdate::Event(generation, event) => self.apply_event(generation, &event),
            ShellUpdate::Outcome(generation, outcome) => self.apply_outcome(generation, outcome),
        }
    }

    /// Advances the visible state from an intermediate event. Stale
    /// generations are a no-op.
    pub fn apply_event(&mut self, generation: Generation, event: &PipelineEvent) {
        if generation != self.generation {
            self.stale_discards += 1;
            return;
        }

        match event {
            PipelineEvent::ProbeStarted { index, .. } => {
                self.state = ResolutionState::Probing(*index);
            }
            PipelineEvent::EmbedStarted { .. } => {
                self.state = ResolutionState::Embedding;
            }
            PipelineEvent::EmbedFailed { .. } => {
                self.state = ResolutionState::EmbeddedFailed;
            }
            _ => {}
        }
    }

    /// Applies the terminal outcome of a pipeline run.
    ///
    /// A stale outcome never mutates display state, but any handle it
    /// carries is still revoked here so abandoned runs cannot leak.
    pub fn apply_outcome(&mut self, generation: Generation, outcome: PipelineOutcome) {
        if generation != self.generation {
            if let Some(mut handle) = outcome.handle {
                tracing::debug!(handle = %handle.id(), "Revoking handle from stale pipeline run");
                handle.revoke();
            }
            self.stale_discards += 1;
            return;
        }

        // A primary run ending in the placeholder hands over to the
        // fallback reference, if one is configured.
        if matches!(outcome.state, ResolutionState::Fallback)
            && !self.resolving_fallback
            && self
                .fallback_reference
                .as_deref()
                .is_some_and(|r| !r.trim().is_empty())
        {
            self.resolving_fallback = true;
            self.restart_resolution(0);
            return;
        }

        if let Some(handle) = outcome.handle {
            self.slot.install(handle);
        }
        self.resolved_index = outcome.resolved_index;

        // A materialized resolution whose handle is already dead cannot be
        // displayed; treat it as a failure of that index and move on.
        if matches!(
            outcome.state,
            ResolutionState::Resolved(ResolvedVia::Materialized { .. })
        ) && self.slot.current().is_none()
        {
            self.resume_past_failed_index();
            return;
        }

        self.image = outcome.image;
        self.protocol = None;
        self.state = outcome.state;
    }

    /// Re-checks that a materialized display source is still usable; if the
    /// handle died after attach, resolution re-enters past the index that
    /// produced it. Called on every render.
    pub fn validate_display(&mut self) {
        if matches!(
            self.state,
            ResolutionState::Resolved(ResolvedVia::Materialized { .. })
        ) && self.slot.current().is_none_or(|h| h.is_revoked())
        {
            tracing::warn!("Materialized display source became unusable; resuming past it");
            self.resume_past_failed_index();
        }
    }

    /// Releases the materialized bytes backing the current display, for
    /// example when the host reclaims memory for offscreen instances. The
    /// next render notices the dead source and re-enters resolution.
    pub fn release_handle(&mut self) {
        self.slot.revoke();
    }

    /// Re-enters resolution after the resolved display source died,
    /// advancing past the candidate that produced it.
    fn resume_past_failed_index(&mut self) {
        let resume = self.resolved_index.map_or(0, |i| i + 1);
        self.restart_resolution(resume);
    }

    fn restart_resolution(&mut self, resume_index: usize) {
        self.slot.revoke();
        self.image = None;
        self.protocol = None;
        self.resolved_index = None;
        self.resume_index = resume_index;
        self.generation += 1;
        self.state = ResolutionState::Classifying;
    }

    /// Absorbs input aimed at the embedded viewer.
    ///
    /// While the embedded preview is displayed, every event inside the
    /// widget is consumed so the viewer behaves like a static image; clicks
    /// and drags never reach the embedded content.
    #[must_use]
    pub const fn handle_event(&self, _event: &Event) -> bool {
        self.state.is_embedded()
    }

    /// Number of updates discarded for carrying a stale generation.
    #[must_use]
    pub const fn stale_discards(&self) -> u64 {
        self.stale_discards
    }

    /// Handle creations over this instance's lifetime.
    #[must_use]
    pub const fn handles_created(&self) -> u64 {
        self.slot.created_count()
    }

    /// Handle revocations over this instance's lifetime.
    #[must_use]
    pub const fn handles_revoked(&self) -> u64 {
        self.slot.revoked_count()
    }

    /// Builds the render protocol for the decoded image if missing.
    pub fn update_protocol_if_needed(&mut self, picker: &Picker) {
        if self.protocol.is_some() {
            return;
        }
        if let Some(ref image) = self.image {
            self.protocol = Some(picker.new_resize_protocol((**image).clone()));
        }
    }

    /// Renders the shell into the buffer as a pure function of state.
    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        self.validate_display();

        match &self.state {
            ResolutionState::Idle
            | ResolutionState::Classifying
            | ResolutionState::Probing(_)
            | ResolutionState::Embedding => {
                Paragraph::new("Loading image…")
                    .alignment(Alignment::Center)
                    .block(Block::default().borders(Borders::ALL))
                    .render(area, buf);
            }
            ResolutionState::Resolved(_) => {
                if let Some(protocol) = &mut self.protocol {
                    StatefulImage::default().render(area, buf, protocol);
                } else {
                    Paragraph::new("Loading image…")
                        .alignment(Alignment::Center)
                        .render(area, buf);
                }
            }
            ResolutionState::EmbeddedResolved { preview_url } => {
                Paragraph::new(preview_url.as_str())
                    .alignment(Alignment::Center)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .title("preview (read-only)"),
                    )
                    .render(area, buf);
            }
            ResolutionState::EmbeddedFailed | ResolutionState::Fallback => {
                Paragraph::new(self.fallback_alt.as_str())
                    .alignment(Alignment::Center)
                    .style(Style::default().add_modifier(Modifier::DIM))
                    .block(Block::default().borders(Borders::ALL))
                    .render(area, buf);
            }
        }
    }

    /// Suggested render height for the current state.
    #[must_use]
    pub fn height(&self) -> u16 {
        if self.image.is_some() {
            MAX_IMAGE_HEIGHT
        } else {
            3
        }
    }
}

impl std::fmt::Debug for RemoteImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteImage")
            .field("reference", &self.reference)
            .field("generation", &self.generation)
            .field("state", &self.state)
            .field("has_image", &self.image.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

    use super::*;
    use crate::domain::entities::{HandleId, ProbeMethod, ResourceHandle};

    fn click() -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 1,
            row: 1,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn materialized_outcome(url: &str) -> PipelineOutcome {
        let handle = ResourceHandle::new(HandleId::from_url(url), Bytes::from_static(b"img"));
        PipelineOutcome {
            state: ResolutionState::Resolved(ResolvedVia::Materialized {
                handle_id: handle.id().clone(),
            }),
            image: Some(Arc::new(image::DynamicImage::new_rgb8(2, 2))),
            handle: Some(handle),
            resolved_index: Some(0),
        }
    }

    fn fallback_outcome() -> PipelineOutcome {
        PipelineOutcome {
            state: ResolutionState::Fallback,
            image: None,
            handle: None,
            resolved_index: None,
        }
    }

    #[test]
    fn test_empty_reference_is_immediate_fallback() {
        let shell = RemoteImage::new("", "no image");
        assert_eq!(*shell.state(), ResolutionState::Fallback);
        assert!(!shell.needs_resolution());
    }

    #[test]
    fn test_new_reference_starts_classifying() {
        let shell = RemoteImage::new("https://cdn.example.com/shirt.png", "no image");
        assert_eq!(*shell.state(), ResolutionState::Classifying);
        assert!(shell.needs_resolution());
    }

    #[test]
    fn test_probe_events_advance_state_in_order() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/ABC/view", "alt");
        let generation = shell.generation();

        for index in 0..4 {
            shell.apply_event(
                generation,
                &PipelineEvent::ProbeStarted {
                    index,
                    method: ProbeMethod::Thumbnail,
                    url: "https://host/x".into(),
                },
            );
            assert_eq!(*shell.state(), ResolutionState::Probing(index));
        }

        shell.apply_event(
            generation,
            &PipelineEvent::EmbedStarted {
                preview_url: "https://host/preview".into(),
            },
        );
        assert_eq!(*shell.state(), ResolutionState::Embedding);
    }

    #[test]
    fn test_source_change_discards_previous_run() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/OLD/view", "alt");
        let old_generation = shell.generation();
        shell.apply_event(
            old_generation,
            &PipelineEvent::ProbeStarted {
                index: 1,
                method: ProbeMethod::UserContentMirror,
                url: "https://host/old".into(),
            },
        );
        assert_eq!(*shell.state(), ResolutionState::Probing(1));

        let new_generation = shell.set_reference("https://drive.google.com/file/d/NEW/view");
        assert_eq!(*shell.state(), ResolutionState::Classifying);
        assert!(new_generation > old_generation);

        // Late completion from the abandoned run must not mutate state and
        // must not leak its handle.
        shell.apply_outcome(old_generation, materialized_outcome("https://host/old"));
        assert_eq!(*shell.state(), ResolutionState::Classifying);
        assert_eq!(shell.stale_discards(), 1);
        assert_eq!(shell.handles_created(), 0);
    }

    #[test]
    fn test_materialized_outcome_installs_handle() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/ABC/view", "alt");
        let generation = shell.generation();

        shell.apply_outcome(generation, materialized_outcome("https://host/x"));
        assert!(shell.state().is_resolved());
        assert_eq!(shell.handles_created(), 1);
        assert_eq!(shell.handles_revoked(), 0);

        shell.set_reference("https://cdn.example.com/other.png");
        assert_eq!(shell.handles_created(), shell.handles_revoked());
    }

    #[test]
    fn test_handle_balance_over_repeated_source_changes() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/A0/view", "alt");
        for i in 0..5 {
            let generation = shell.generation();
            shell.apply_outcome(generation, materialized_outcome(&format!("https://host/{i}")));
            shell.set_reference(format!("https://drive.google.com/file/d/A{}/view", i + 1));
        }
        assert_eq!(shell.handles_created(), 5);
        assert_eq!(shell.handles_revoked(), 5);
    }

    #[test]
    fn test_embedded_viewer_absorbs_input() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/ABC/view", "alt");
        let generation = shell.generation();
        shell.apply_outcome(
            generation,
            PipelineOutcome {
                state: ResolutionState::EmbeddedResolved {
                    preview_url: "https://drive.google.com/file/d/ABC/preview".into(),
                },
                image: None,
                handle: None,
                resolved_index: None,
            },
        );

        let state_before = shell.state().clone();
        assert!(shell.handle_event(&click()));
        assert_eq!(*shell.state(), state_before);
    }

    #[test]
    fn test_input_passes_through_when_not_embedded() {
        let mut shell = RemoteImage::new("https://cdn.example.com/shirt.png", "alt");
        assert!(!shell.handle_event(&click()));

        let generation = shell.generation();
        shell.apply_outcome(
            generation,
            PipelineOutcome {
                state: ResolutionState::Resolved(ResolvedVia::Remote {
                    url: "https://cdn.example.com/shirt.png".into(),
                    method: ProbeMethod::DirectFetch,
                }),
                image: Some(Arc::new(image::DynamicImage::new_rgb8(2, 2))),
                handle: None,
                resolved_index: Some(0),
            },
        );
        assert!(!shell.handle_event(&click()));
    }

    #[test]
    fn test_dead_on_arrival_handle_resumes_past_its_index() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/ABC/view", "alt");
        let generation = shell.generation();

        let mut handle =
            ResourceHandle::new(HandleId::from_url("https://host/x"), Bytes::from_static(b"img"));
        let handle_id = handle.id().clone();
        handle.revoke();

        shell.apply_outcome(
            generation,
            PipelineOutcome {
                state: ResolutionState::Resolved(ResolvedVia::Materialized { handle_id }),
                image: Some(Arc::new(image::DynamicImage::new_rgb8(2, 2))),
                handle: Some(handle),
                resolved_index: Some(1),
            },
        );

        // Failure of index 1, not a restart from the top.
        assert_eq!(*shell.state(), ResolutionState::Classifying);
        assert!(shell.needs_resolution());
        assert_eq!(shell.resume_index(), 2);
        assert!(shell.generation() > generation);
    }

    #[test]
    fn test_released_handle_reenters_resolution_on_render() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/ABC/view", "alt");
        let generation = shell.generation();
        shell.apply_outcome(generation, materialized_outcome("https://host/x"));
        assert!(shell.state().is_resolved());

        // The host reclaims the bytes; the next render must notice the
        // dead source and resume past the candidate that produced it.
        shell.release_handle();
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        shell.render(area, &mut buf);

        assert_eq!(*shell.state(), ResolutionState::Classifying);
        assert!(shell.needs_resolution());
        assert_eq!(shell.resume_index(), 1);
        assert!(shell.generation() > generation);
        assert_eq!(shell.handles_created(), shell.handles_revoked());

        let rendered: String = buf.content().iter().map(ratatui::buffer::Cell::symbol).collect();
        assert!(rendered.contains("Loading"));
    }

    #[test]
    fn test_fallback_outcome_hands_over_to_fallback_reference() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/ABC/view", "alt")
            .with_fallback_reference("https://cdn.example.com/fallback.png");
        let first_generation = shell.generation();

        shell.apply_outcome(first_generation, fallback_outcome());

        assert_eq!(*shell.state(), ResolutionState::Classifying);
        assert!(shell.needs_resolution());
        assert_eq!(
            shell.resolution_target(),
            "https://cdn.example.com/fallback.png"
        );
        assert!(shell.generation() > first_generation);

        // The fallback run failing too is terminal: alt text from here.
        let second_generation = shell.generation();
        shell.apply_outcome(second_generation, fallback_outcome());
        assert_eq!(*shell.state(), ResolutionState::Fallback);
    }

    #[test]
    fn test_fallback_outcome_without_fallback_reference_is_terminal() {
        let mut shell = RemoteImage::new("https://drive.google.com/file/d/ABC/view", "alt");
        shell.apply_outcome(shell.generation(), fallback_outcome());
        assert_eq!(*shell.state(), ResolutionState::Fallback);
        assert!(!shell.needs_resolution());
    }

    #[test]
    fn test_fallback_renders_alt_text() {
        let mut shell = RemoteImage::new("", "product image unavailable");
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        shell.render(area, &mut buf);

        let rendered: String = buf.content().iter().map(ratatui::buffer::Cell::symbol).collect();
        assert!(rendered.contains("product image unavailable"));
    }

    #[test]
    fn test_loading_renders_affordance() {
        let mut shell = RemoteImage::new("https://cdn.example.com/shirt.png", "alt");
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        shell.render(area, &mut buf);

        let rendered: String = buf.content().iter().map(ratatui::buffer::Cell::symbol).collect();
        assert!(rendered.contains("Loading"));
    }
}
