//! Administration commands.

use ramm_client::admin::{self, AdminSection, AdminView};
use ramm_core::ListingId;

use crate::context::Context;
use crate::render;

pub async fn users(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.session()?;
    let mut view = AdminView::open(&ctx.api, &session)?;
    let users = view
        .users()
        .await
        .map_err(|e| admin::error_message(AdminSection::Users, &e))?;

    let mut out = render::stdout();
    render::heading(&mut out, "Users")?;
    render::users(&mut out, users)?;
    Ok(())
}

pub async fn listings(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.session()?;
    let mut view = AdminView::open(&ctx.api, &session)?;
    let listings = view
        .listings()
        .await
        .map_err(|e| admin::error_message(AdminSection::Listings, &e))?;

    let mut out = render::stdout();
    render::heading(&mut out, "Listings")?;
    render::moderation(&mut out, listings)?;
    Ok(())
}

pub async fn toggle(ctx: &Context, id: ListingId) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.session()?;
    let mut view = AdminView::open(&ctx.api, &session)?;
    let action = view
        .toggle_listing(id)
        .await
        .map_err(|e| admin::toggle_error_message(&e))?;

    let listings = view
        .listings()
        .await
        .map_err(|e| admin::error_message(AdminSection::Listings, &e))?;
    let mut out = render::stdout();
    render::message(&mut out, &format!("{} applied to product {id}.", action.label()))?;
    render::moderation(&mut out, listings)?;
    Ok(())
}
