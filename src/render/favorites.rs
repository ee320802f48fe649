use std::fmt::Write;

use super::html::escape;
use super::RenderContext;
use crate::favorites::{FavoritesDisplay, FavoritesViewState, UnresolvedFavorite};
use crate::model::{Movie, MovieId};
use crate::tmdb::poster_url;

pub fn render_favorites(state: &FavoritesViewState, ctx: &RenderContext<'_>) -> String {
    let mut out = String::from("<div class=\"favourites-page\">\n<div class=\"grid\">\n");

    match state.display() {
        FavoritesDisplay::Loading => out.push_str("<div class=\"status\">Loading...</div>\n"),
        FavoritesDisplay::Failed(message) => {
            let _ = writeln!(out, "<div class=\"error\">{}</div>", escape(message));
        }
        FavoritesDisplay::Empty => {
            out.push_str("<div class=\"empty\">Nothing added to favorites yet!</div>\n")
        }
        FavoritesDisplay::Grid { movies, unresolved } => {
            for movie in movies {
                grid_cell(&mut out, movie, ctx);
            }
            for item in unresolved {
                unresolved_cell(&mut out, item, ctx);
            }
        }
    }

    out.push_str("</div>\n</div>");
    out
}

fn grid_cell(out: &mut String, movie: &Movie, ctx: &RenderContext<'_>) {
    let title = escape(&movie.title);
    let _ = writeln!(out, "<div class=\"grid-item\" data-movie-id=\"{}\">", movie.id);
    out.push_str("<div class=\"movie-card\">\n");
    match movie.poster_path.as_deref() {
        Some(path) => {
            let _ = writeln!(
                out,
                "<img class=\"movie-poster\" src=\"{}\" alt=\"{}\">",
                escape(&poster_url(ctx.image_base_url, path)),
                title
            );
        }
        None => out.push_str("<div class=\"movie-poster missing\"></div>\n"),
    }
    let _ = writeln!(out, "<h3 class=\"movie-title\">{}</h3>", title);
    let _ = writeln!(out, "<span class=\"movie-rating\">{:.1}</span>", movie.vote_average);
    if let Some(year) = movie.release_year() {
        let _ = writeln!(out, "<span class=\"movie-year\">{}</span>", year);
    }
    out.push_str("</div>\n");
    delete_control(out, movie.id, ctx);
    out.push_str("</div>\n");
}

fn unresolved_cell(out: &mut String, item: &UnresolvedFavorite, ctx: &RenderContext<'_>) {
    let _ = writeln!(
        out,
        "<div class=\"grid-item unresolved\" data-movie-id=\"{}\">",
        item.id
    );
    let _ = writeln!(
        out,
        "<p class=\"unresolved-reason\">Movie {} is unavailable: {}</p>",
        item.id,
        escape(&item.reason)
    );
    delete_control(out, item.id, ctx);
    out.push_str("</div>\n");
}

/// The backend deletion itself is done client side; once it succeeds the
/// page posts to `data-on-deleted` so the view drops the movie.
fn delete_control(out: &mut String, id: MovieId, ctx: &RenderContext<'_>) {
    let _ = writeln!(
        out,
        "<button type=\"button\" class=\"delete-favorite\" data-movie-id=\"{id}\" \
         data-on-deleted=\"{}/favorites/{id}/deleted\">Remove</button>",
        ctx.user_path()
    );
}
