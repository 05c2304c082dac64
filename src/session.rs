//! Presentation-state adapter for callers embedding the pipeline in a UI.
//!
//! The pipeline itself is a pure function of one file; everything a drop
//! surface needs beyond that — the phase machine, the nested drag-region
//! counter, and the in-flight guard — lives here so hosting code does not
//! reinvent it per surface.
//!
//! ```text
//! Idle ──begin──▶ Processing ──succeed──▶ Success ─┐
//!  ▲                   │                           │
//!  │                   └──fail──▶ Error/NotInvoice ┤
//!  └────────────────────reset──────────────────────┘
//! ```
//!
//! The three terminal phases stay distinct so "not an invoice" renders as
//! its own state rather than a generic error banner.
//!
//! Submission policy: a new file offered while a request is outstanding is
//! ignored ([`Session::begin`] returns `false`). The pipeline has no
//! cancellation, so guarding is the only self-consistent choice.

use crate::error::Classification;

/// Where the surface currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Waiting for a file.
    #[default]
    Idle,
    /// One extraction request is in flight.
    Processing,
    /// Terminal: extraction succeeded.
    Success,
    /// Terminal: extraction failed.
    Error,
    /// Terminal: the model said this is not an invoice.
    NotInvoice,
}

impl Phase {
    /// True for the three terminal phases.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Success | Phase::Error | Phase::NotInvoice)
    }
}

/// UI bookkeeping for one drop surface.
#[derive(Debug, Default)]
pub struct Session {
    phase: Phase,
    drag_depth: u32,
    disabled: bool,
}

impl Session {
    /// A fresh, idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Assert or clear the caller-supplied disabled gate.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// True while the pointer is over the surface with a dragged file.
    ///
    /// Drag-enter/leave events fire per nested child region, so a plain
    /// boolean flickers; active is defined as depth > 0 instead.
    pub fn is_drag_active(&self) -> bool {
        self.drag_depth > 0
    }

    /// A drag entered this surface or one of its children.
    pub fn drag_enter(&mut self) {
        self.drag_depth = self.drag_depth.saturating_add(1);
    }

    /// A drag left this surface or one of its children.
    pub fn drag_leave(&mut self) {
        self.drag_depth = self.drag_depth.saturating_sub(1);
    }

    /// Try to start processing a dropped or picked file.
    ///
    /// Returns `false` — and changes nothing — while disabled or while a
    /// request is already in flight. On acceptance the drag counter resets
    /// and the phase moves to [`Phase::Processing`].
    pub fn begin(&mut self) -> bool {
        if self.disabled || self.phase == Phase::Processing {
            return false;
        }
        self.drag_depth = 0;
        self.phase = Phase::Processing;
        true
    }

    /// Record a successful extraction. No-op unless processing.
    pub fn succeed(&mut self) {
        if self.phase == Phase::Processing {
            self.phase = Phase::Success;
        }
    }

    /// Record a failed extraction with its classification. No-op unless
    /// processing.
    pub fn fail(&mut self, classification: Classification) {
        if self.phase == Phase::Processing {
            self.phase = match classification {
                Classification::NotInvoice => Phase::NotInvoice,
                Classification::Error => Phase::Error,
            };
        }
    }

    /// Return to idle from a terminal phase and clear the drag counter.
    ///
    /// Ignored while processing — an issued request cannot be cancelled, so
    /// the phase must not lie about it.
    pub fn reset(&mut self) {
        if self.phase != Phase::Processing {
            self.phase = Phase::Idle;
            self.drag_depth = 0;
        }
    }
}
