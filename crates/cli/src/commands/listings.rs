//! Listing commands: browse, search, update, delete, buy and create.

use std::path::PathBuf;
use std::sync::Arc;

use ramm_client::create::{CreationFlow, ImageFile, ListingDraft};
use ramm_client::listings::{
    BrowseQuery, DeleteOutcome, EditForm, ListingCollection, ListingQuery, SearchForm,
};
use ramm_client::{ClientError, Route, Session};
use ramm_core::ListingId;

use crate::context::Context;
use crate::{prompt, render};

/// Field changes given on the command line; omitted fields keep their value.
pub struct Changes {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub image_key: Option<String>,
}

impl Changes {
    fn apply(self, form: &mut EditForm) {
        let fields = [
            (self.name, &mut form.name),
            (self.category, &mut form.category),
            (self.price, &mut form.price),
            (self.description, &mut form.description),
            (self.image_key, &mut form.image_key),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

/// A listing to create.
pub struct NewListing {
    pub name: String,
    pub price: String,
    pub category: String,
    pub seller_id: Option<String>,
    pub image: Option<PathBuf>,
}

pub async fn list(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.session()?;
    let mut collection = ListingCollection::new(&ctx.api, &session, BrowseQuery);
    show(ctx, &mut collection, "Failed to fetch products").await
}

pub async fn search(ctx: &Context, form: &SearchForm) -> Result<(), Box<dyn std::error::Error>> {
    let query = form.validate()?;
    let session = ctx.session()?;
    let mut collection = ListingCollection::new(&ctx.api, &session, query);
    show(ctx, &mut collection, "Failed to fetch search results").await
}

async fn show<Q: ListingQuery>(
    ctx: &Context,
    collection: &mut ListingCollection<'_, Q>,
    action: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = collection.load().await {
        return Err(e.user_message(action).into());
    }

    let mut out = render::stdout();
    render::heading(&mut out, collection.title())?;
    render::listings(
        &mut out,
        collection.items(),
        &collection.empty_message(),
        &ctx.config.cdn_base_url,
        |listing| collection.actions_for(listing),
    )?;
    if let Some(route) = collection.create_route() {
        render::message(&mut out, &format!("\nAdd a product: ramm add-product ({route})"))?;
    }
    Ok(())
}

/// Load the collection the command acts on.
async fn loaded<'a>(
    ctx: &'a Context,
    session: &'a Session,
) -> Result<ListingCollection<'a, BrowseQuery>, ClientError> {
    let mut collection = ListingCollection::new(&ctx.api, session, BrowseQuery);
    collection.load().await?;
    Ok(collection)
}

pub async fn update(ctx: &Context, id: ListingId, changes: Changes) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.signed_in()?;
    let mut collection = loaded(ctx, &session).await?;

    let current = collection
        .items()
        .iter()
        .find(|listing| listing.id == id)
        .ok_or_else(|| ClientError::validation(format!("Product {id} is not in your list.")))?;
    let mut form = EditForm::from_listing(current);
    changes.apply(&mut form);

    let updated = match collection.update(id, &form).await {
        Ok(listing) => listing.clone(),
        Err(e @ ClientError::Validation(_)) => return Err(e.into()),
        Err(e) => return Err(e.user_message("Update failed").into()),
    };

    let mut out = render::stdout();
    render::message(&mut out, "Product updated successfully!")?;
    render::listings(
        &mut out,
        std::slice::from_ref(&updated),
        "",
        &ctx.config.cdn_base_url,
        |listing| collection.actions_for(listing),
    )?;
    Ok(())
}

pub async fn delete(ctx: &Context, id: ListingId, yes: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.signed_in()?;
    let mut collection = loaded(ctx, &session).await?;

    let confirm = |question: &str| yes || prompt::confirm(question);
    match collection.delete(id, &confirm).await {
        Ok(DeleteOutcome::Deleted) => {
            render::message(&mut render::stdout(), "Product deleted successfully!")?;
            Ok(())
        }
        Ok(DeleteOutcome::Cancelled) => {
            render::message(&mut render::stdout(), "Delete cancelled.")?;
            Ok(())
        }
        Err(e @ ClientError::Validation(_)) => Err(e.into()),
        Err(e) => Err(e.user_message("Delete failed").into()),
    }
}

pub async fn buy(ctx: &Context, id: ListingId) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.signed_in()?;
    let collection = loaded(ctx, &session).await?;
    let route = collection.buy(id)?;

    // Buying lands on the orders view with the purchase pending
    super::orders::open(ctx, &session, &route).await
}

pub async fn add(ctx: &Context, listing: NewListing) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.session()?;
    let mut draft = ListingDraft::for_session(&session);
    draft.name = listing.name;
    draft.price = listing.price;
    draft.category = listing.category;
    if let Some(seller_id) = listing.seller_id {
        draft.seller_id = seller_id;
    }

    let image = match &listing.image {
        Some(path) => Some(ImageFile::read(path).await?),
        None => None,
    };

    let flow = CreationFlow::new(&ctx.api)
        .with_step_observer(Arc::new(|step| tracing::info!("{step}")))
        .with_progress(Arc::new(|percent| tracing::debug!(percent, "Upload progress")));

    match flow.submit(&draft, image.as_ref()).await {
        Ok(id) => {
            let mut out = render::stdout();
            render::message(&mut out, &format!("Product created with ID {id}."))?;
            render::message(&mut out, &format!("Back to: {}", Route::Products))?;
            Ok(())
        }
        Err(e) => {
            if let Some(key) = &e.orphaned_key {
                tracing::warn!(key = %key, "Uploaded image was not attached to a listing");
            }
            Err(e.into())
        }
    }
}
