//! Plain-text rendering to stdout.

use std::io::{self, Write};

use ramm_client::Session;
use ramm_client::admin::ModerationAction;
use ramm_client::listings::ListingActions;
use ramm_core::{Listing, Order, UserSummary};

pub fn stdout() -> io::StdoutLock<'static> {
    io::stdout().lock()
}

pub fn message(out: &mut impl Write, text: &str) -> io::Result<()> {
    writeln!(out, "{text}")
}

pub fn heading(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "=".repeat(title.chars().count()))
}

/// One line per listing, with the actions the viewer is offered.
pub fn listings(
    out: &mut impl Write,
    items: &[Listing],
    empty_message: &str,
    cdn_base: &str,
    actions: impl Fn(&Listing) -> ListingActions,
) -> io::Result<()> {
    if items.is_empty() {
        return message(out, empty_message);
    }
    for listing in items {
        listing_line(out, listing)?;
        let offered = action_labels(actions(listing));
        if !offered.is_empty() {
            writeln!(out, "    actions: {}", offered.join(", "))?;
        }
        if let Some(url) = listing.image_url(cdn_base) {
            writeln!(out, "    image: {url}")?;
        }
    }
    Ok(())
}

/// Admin listing table. Sold listings show no action.
pub fn moderation(out: &mut impl Write, items: &[Listing]) -> io::Result<()> {
    if items.is_empty() {
        return message(out, "No products found.");
    }
    for listing in items {
        listing_line(out, listing)?;
        match ModerationAction::for_status(listing.status) {
            Some(action) => writeln!(out, "    action: {}", action.label())?,
            None => writeln!(out, "    action: none (sold)")?,
        }
    }
    Ok(())
}

pub fn orders(out: &mut impl Write, items: &[Order]) -> io::Result<()> {
    if items.is_empty() {
        return message(out, ramm_client::orders::EMPTY_MESSAGE);
    }
    for order in items {
        let price = order
            .price
            .map_or_else(|| "-".to_string(), |price| price.to_string());
        writeln!(
            out,
            "#{} {} | {} | {}",
            order.transaction_id,
            order.name.as_deref().unwrap_or("(unnamed)"),
            order.category.as_deref().unwrap_or("-"),
            price
        )?;
        if let Some(created_at) = order.created_at {
            writeln!(out, "    Placed on {}", created_at.format("%Y-%m-%d %H:%M"))?;
        }
        if let Some(status) = &order.status {
            writeln!(out, "    Status: {status}")?;
        }
    }
    Ok(())
}

pub fn users(out: &mut impl Write, items: &[UserSummary]) -> io::Result<()> {
    if items.is_empty() {
        return message(out, "No users found.");
    }
    for user in items {
        writeln!(out, "{} | {} | {}", user.id, user.email, user.role)?;
    }
    Ok(())
}

pub fn session(out: &mut impl Write, session: &Session) -> io::Result<()> {
    if !session.is_authenticated() {
        return message(out, "Not signed in.");
    }
    writeln!(out, "email: {}", session.email())?;
    writeln!(out, "user id: {}", session.user_id())?;
    writeln!(out, "role: {}", session.raw_role().unwrap_or("buyer"))
}

fn listing_line(out: &mut impl Write, listing: &Listing) -> io::Result<()> {
    writeln!(
        out,
        "#{} {} | {} | {} | {}",
        listing.id,
        listing.title,
        listing.category.as_deref().unwrap_or("-"),
        listing.price,
        listing.status
    )
}

fn action_labels(actions: ListingActions) -> Vec<&'static str> {
    [
        (actions.update, "update"),
        (actions.delete, "delete"),
        (actions.buy, "buy"),
    ]
    .into_iter()
    .filter_map(|(offered, label)| offered.then_some(label))
    .collect()
}
