use std::fmt::Write;

use super::html::escape;
use super::RenderContext;
use crate::carousel::PosterCarousel;
use crate::tmdb::poster_url;

pub fn render_carousel(carousel: &PosterCarousel, ctx: &RenderContext<'_>) -> String {
    let base = format!("{}/carousel", ctx.user_path());
    let mut out = String::from("<h1>Top Favourite Movies</h1>\n<div class=\"slider-container\">\n");

    if let Some(movie) = carousel.current() {
        let _ = writeln!(
            out,
            "<a class=\"slider-button slider-button-left\" href=\"{base}?action=prev\">&lsaquo;</a>"
        );
        let alt = if movie.title.is_empty() {
            "Movie Poster".to_string()
        } else {
            escape(&movie.title)
        };
        match movie.poster_path.as_deref() {
            Some(path) => {
                let _ = writeln!(
                    out,
                    "<img class=\"movie-image\" src=\"{}\" alt=\"{}\">",
                    escape(&poster_url(ctx.image_base_url, path)),
                    alt
                );
            }
            None => {
                let _ = writeln!(out, "<div class=\"movie-image missing\">{}</div>", alt);
            }
        }
        let _ = writeln!(
            out,
            "<a class=\"slider-button slider-button-right\" href=\"{base}?action=next\">&rsaquo;</a>"
        );
    }
    out.push_str("</div>\n");

    if carousel.is_empty() {
        out.push_str("<p>There are no favorite movies.</p>\n");
    } else {
        out.push_str("<div class=\"slider-dots\">\n");
        for (index, current) in carousel.selectors(ctx.selectors) {
            let _ = writeln!(
                out,
                "<a class=\"movie-slider-dot-button\" href=\"{base}?action=jump&amp;index={index}\">\
                 <span class=\"{}\"></span></a>",
                if current { "circle-dot" } else { "circle" }
            );
        }
        out.push_str("</div>\n");
    }

    let _ = write!(
        out,
        "<a class=\"view-more\" href=\"{}/favorites\">View More</a>",
        ctx.user_path()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::aggregator::testing::movie;

    const CTX: RenderContext<'static> = RenderContext {
        username: "alice",
        image_base_url: "https://image.tmdb.org/t/p/w300",
        selectors: 3,
    };

    #[test]
    fn test_empty_carousel_renders_fallback() {
        let html = render_carousel(&PosterCarousel::new(Vec::new()), &CTX);
        assert!(html.contains("There are no favorite movies."));
        assert!(!html.contains("movie-image"));
        assert!(!html.contains("slider-button"));
        assert!(!html.contains("movie-slider-dot-button"));
    }

    #[test]
    fn test_current_poster_and_dots() {
        let mut carousel = PosterCarousel::new((1..=5).map(|i| movie(i, "Movie")).collect());
        carousel.next();
        let html = render_carousel(&carousel, &CTX);

        assert!(html.contains("src=\"https://image.tmdb.org/t/p/w300/2.jpg\""));
        assert_eq!(html.matches("movie-slider-dot-button").count(), 3);
        assert_eq!(html.matches("\"circle-dot\"").count(), 1);
        assert!(html.contains("href=\"/alice/carousel?action=jump&amp;index=1\"><span class=\"circle-dot\">"));
        assert!(html.contains("href=\"/alice/carousel?action=prev\""));
        assert!(html.contains("href=\"/alice/carousel?action=next\""));
        assert!(html.contains("href=\"/alice/favorites\">View More"));
    }

    #[test]
    fn test_cursor_past_selectors_has_no_active_dot() {
        let mut carousel = PosterCarousel::new((1..=5).map(|i| movie(i, "Movie")).collect());
        carousel.jump_to(4).unwrap();
        let html = render_carousel(&carousel, &CTX);
        assert_eq!(html.matches("\"circle-dot\"").count(), 0);
        assert!(html.contains("/5.jpg"));
    }

    #[test]
    fn test_untitled_movie_alt_text() {
        let carousel = PosterCarousel::new(vec![movie(7, "")]);
        let html = render_carousel(&carousel, &CTX);
        assert!(html.contains("alt=\"Movie Poster\""));
    }
}
