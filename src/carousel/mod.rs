mod state;

pub use state::{CarouselAction, CarouselError, NavigationKind, PosterCarousel};
