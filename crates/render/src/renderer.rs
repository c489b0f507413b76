use std::fmt::Write as _;

use crate::batch::SpriteBatch;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads sprite batches and draws them. It never mutates the
/// batches; slot data is owned by the streaming layer.
pub trait Renderer {
    /// Enable or disable depth testing for subsequent draws.
    fn set_depth_test(&mut self, enabled: bool);

    /// Draw every visible sprite of `batch` in its draw order.
    fn draw_batch(&mut self, batch: &SpriteBatch, pixelated: bool);
}

/// Debug text renderer, used headless.
///
/// Produces a human-readable listing of each draw call. Useful for CLI
/// output, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    output: String,
    draw_calls: usize,
    depth_test: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Draw calls issued since construction or the last [`Self::take_output`].
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    pub fn depth_test(&self) -> bool {
        self.depth_test
    }

    /// Return the accumulated text and reset the call counter.
    pub fn take_output(&mut self) -> String {
        self.draw_calls = 0;
        std::mem::take(&mut self.output)
    }
}

impl Renderer for DebugTextRenderer {
    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
        let _ = writeln!(self.output, "depth_test={enabled}");
    }

    fn draw_batch(&mut self, batch: &SpriteBatch, pixelated: bool) {
        self.draw_calls += 1;
        let _ = writeln!(
            self.output,
            "=== Batch (capacity={}, visible={}, pixelated={}) ===",
            batch.capacity(),
            batch.visible_count(),
            pixelated
        );
        for sprite in batch.visible_sprites() {
            let _ = writeln!(
                self.output,
                "  [{:>4}] pos=({:.2}, {:.2}) depth={:.2} tex={:016x}",
                sprite.slot.0, sprite.position.x, sprite.position.y, sprite.depth, sprite.texture.0
            );
        }
    }
}
