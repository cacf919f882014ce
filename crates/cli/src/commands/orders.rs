//! Order commands: history, checkout and finalization.

use ramm_client::finalize::{FinalizationView, FinalizeState, REDIRECT_MESSAGE};
use ramm_client::orders::{self, OrdersView};
use ramm_client::routes::PendingPurchase;
use ramm_client::{ClientError, Route, Session};
use ramm_core::{ListingId, UserId};

use crate::context::Context;
use crate::render;

pub async fn list(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.signed_in()?;
    open(ctx, &session, &Route::Orders(None)).await
}

pub async fn checkout(
    ctx: &Context,
    listing_id: ListingId,
    seller_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.signed_in()?;
    let route = Route::Orders(Some(PendingPurchase {
        listing_id,
        seller_id: UserId::from(seller_id),
    }));
    open(ctx, &session, &route).await
}

/// The orders view: history first, then the checkout for a pending purchase.
pub async fn open(ctx: &Context, session: &Session, route: &Route) -> Result<(), Box<dyn std::error::Error>> {
    let mut view = OrdersView::from_route(&ctx.api, session, route)
        .ok_or_else(|| ClientError::validation(format!("{route} is not the orders page.")))?;
    let mut out = render::stdout();

    render::heading(&mut out, "Your Orders")?;
    if let Some(pending) = view.pending() {
        render::message(
            &mut out,
            &format!(
                "Complete your purchase of product {} from seller {}.",
                pending.listing_id, pending.seller_id
            ),
        )?;
        match view.start_checkout().await {
            Ok(redirect) => {
                render::message(&mut out, "Continue to payment:")?;
                render::message(&mut out, redirect.url.as_str())?;
            }
            Err(e) => render::message(&mut out, &orders::checkout_error_message(&e))?,
        }
        render::message(&mut out, "")?;
    }

    render::message(&mut out, "Past Orders:")?;
    match view.load_orders().await {
        Ok(items) => render::orders(&mut out, items)?,
        Err(e) => render::message(&mut out, &orders::fetch_error_message(&e))?,
    }
    Ok(())
}

/// Finalize from the payment processor's return URL, then follow the
/// redirect to the listings once the delay has passed.
pub async fn finalize(ctx: &Context, url: &str, wait: bool) -> Result<(), Box<dyn std::error::Error>> {
    let route = Route::parse(url)?;
    if !matches!(route, Route::OrderSuccess(_)) {
        return Err(format!("{route} is not an order return URL.").into());
    }

    let outcome = FinalizationView::from_route(&ctx.api, &route).run().await;
    {
        let mut out = render::stdout();
        match &outcome.state {
            FinalizeState::Finalized { transaction_id, .. } => {
                render::message(&mut out, outcome.state.message())?;
                if let Some(transaction_id) = transaction_id {
                    render::message(&mut out, &format!("Transaction {transaction_id}"))?;
                }
            }
            FinalizeState::Errored(message) => {
                render::message(&mut out, "Error!")?;
                render::message(&mut out, message)?;
            }
        }
        render::message(&mut out, REDIRECT_MESSAGE)?;
    }

    if !wait {
        render::message(&mut render::stdout(), &format!("Next: {}", outcome.redirect.to))?;
        return Ok(());
    }
    // Finalization always lands on the listings
    outcome.redirect.wait().await;
    super::listings::list(ctx).await
}
