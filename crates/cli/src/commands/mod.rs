//! Command implementations.

pub mod admin;
pub mod auth;
pub mod listings;
pub mod orders;

use ramm_client::Route;

use crate::context::Context;
use crate::render;

/// Open a route given as a path or full URL.
pub async fn open(ctx: &Context, target: &str) -> Result<(), Box<dyn std::error::Error>> {
    let route = Route::parse(target)?.resolve();
    tracing::debug!(%route, "Opening route");
    dispatch(ctx, route).await
}

async fn dispatch(ctx: &Context, route: Route) -> Result<(), Box<dyn std::error::Error>> {
    let hint = match &route {
        Route::Products => return listings::list(ctx).await,
        Route::Orders(_) => {
            let session = ctx.signed_in()?;
            return orders::open(ctx, &session, &route).await;
        }
        Route::OrderSuccess(_) => return orders::finalize(ctx, &route.to_path(), true).await,
        Route::Admin => return admin::users(ctx).await,
        Route::Root | Route::Login => "ramm login -e <email>",
        Route::Signup => "ramm signup -e <email> -r <buyer|seller>",
        Route::Confirmation => "ramm confirm -e <email> -c <code>",
        Route::AddProduct => "ramm add-product -n <name> -p <price> --image <file>",
        Route::Search => "ramm search -m <mode> <term>",
    };
    render::message(&mut render::stdout(), &format!("{route}: run `{hint}`"))?;
    Ok(())
}
