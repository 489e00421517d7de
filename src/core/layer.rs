use super::canvas::Canvas;
use super::display_context::DisplayContext;

/// Conventional priorities; lower draws first
pub const BACKGROUND: i32 = 0;
/// Decoration drawn over the background but beneath the content
pub const UNDERLAY: i32 = 5;
pub const CONTENT: i32 = 10;
pub const DECORATION: i32 = 20;

/// One step of a render pass
pub trait Layer {
    /// Draw into the shared panel canvas
    fn draw(&self, canvas: &mut Canvas, context: &DisplayContext);

    /// Layer priority for composition (lower = background, higher = foreground)
    fn priority(&self) -> i32 {
        CONTENT
    }
}

/// Composable layer stack, rebuilt for every frame
pub struct LayerStack<'a> {
    layers: Vec<Box<dyn Layer + 'a>>,
}

impl<'a> LayerStack<'a> {
    /// Create empty layer stack
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Add layer and return new stack
    pub fn with_layer(mut self, layer: Box<dyn Layer + 'a>) -> Self {
        self.layers.push(layer);
        // stable: equal priorities keep insertion order
        self.layers.sort_by_key(|l| l.priority());
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Draw every layer in priority order
    pub fn render(&self, canvas: &mut Canvas, context: &DisplayContext) {
        for layer in &self.layers {
            layer.draw(canvas, context);
        }
    }
}

impl Default for LayerStack<'_> {
    fn default() -> Self {
        Self::new()
    }
}
