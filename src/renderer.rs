use plotcore::{Frame, Renderer, SegmentKind};
use tracing::{debug, trace};

/// Renderer that logs the pen path instead of painting it.
///
/// Keeps running totals so that a run can be summarised at the end. Lengths
/// are in normalized units.
#[derive(Debug, Default, Clone)]
pub struct TraceRenderer {
    drawn: f64,
    travelled: f64,
    homings: u32,
}
impl TraceRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total length drawn with the pen down.
    pub fn drawn(&self) -> f64 {
        self.drawn
    }

    /// Total length moved with the pen up.
    pub fn travelled(&self) -> f64 {
        self.travelled
    }

    /// Number of times the canvas was cleared by homing.
    pub fn homings(&self) -> u32 {
        self.homings
    }
}

impl Renderer for TraceRenderer {
    fn present(&mut self, frame: &Frame) {
        if frame.just_homed {
            debug!("homed; clearing canvas");
            self.homings += 1;
        }
        if let Some(segment) = frame.segment {
            match segment.kind {
                SegmentKind::Draw => {
                    trace!("line to {}", segment.to);
                    self.drawn += segment.length();
                }
                SegmentKind::Travel => {
                    trace!("move to {}", segment.to);
                    self.travelled += segment.length();
                }
            }
        }
    }
}
