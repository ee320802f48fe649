//! Server-side HTML for the favorites grid and the poster carousel.

mod carousel;
mod favorites;
mod html;

pub use carousel::render_carousel;
pub use favorites::render_favorites;
pub use html::{escape, page};

/// What the renderers need besides the state itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub username: &'a str,
    pub image_base_url: &'a str,
    pub selectors: usize,
}

impl RenderContext<'_> {
    fn user_path(&self) -> String {
        format!("/{}", urlencoding::encode(self.username))
    }
}
