//! Listing creation: a three-step sequential upload.
//!
//! 1. Request a pre-signed upload target for the image filename.
//! 2. Upload the image bytes to storage, reporting progress.
//! 3. Create the listing referencing the storage key.
//!
//! Each step gates the next. A failure aborts the rest, resets progress to
//! 0 and leaves the draft untouched for a retry, which repeats all steps.
//! An image uploaded before step 3 failed stays in storage.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ramm_core::{ListingId, Price, UserId};
use tracing::{info, instrument, warn};

use crate::api::{ApiClient, ProgressFn};
use crate::error::{ClientError, ErrorKind};
use crate::session::Session;

pub const MISSING_IMAGE_MESSAGE: &str = "Please select an image.";
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in Name, Price, and Seller ID.";
pub const INVALID_PRICE_MESSAGE: &str = "Please enter a valid positive number for price.";

/// Step observer.
pub type StepFn = Arc<dyn Fn(CreationStep) + Send + Sync>;

/// Listing fields as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingDraft {
    pub name: String,
    pub price: String,
    pub category: String,
    pub seller_id: String,
}

impl ListingDraft {
    /// Empty draft owned by the signed-in user.
    #[must_use]
    pub fn for_session(session: &Session) -> Self {
        Self {
            seller_id: session.user_id().to_string(),
            ..Self::default()
        }
    }
}

/// Image to upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Image from memory; the content type follows the extension.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = content_type_for(&filename);
        Self {
            filename,
            content_type,
            bytes,
        }
    }

    /// Read an image from disk.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the file cannot be read.
    pub async fn read(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ClientError::validation(format!("Could not read image {}: {e}", path.display()))
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| ClientError::validation(MISSING_IMAGE_MESSAGE))?;
        Ok(Self::new(filename, bytes))
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// The storage target signs `image/<extension>`; the upload must match it.
fn content_type_for(filename: &str) -> String {
    match Path::new(filename).extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => format!("image/{ext}"),
        _ => "application/octet-stream".to_string(),
    }
}

/// Step of the creation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStep {
    RequestUploadUrl,
    UploadImage,
    CreateListing,
}

impl fmt::Display for CreationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequestUploadUrl => f.write_str("Step 1/3: Requesting upload URL..."),
            Self::UploadImage => f.write_str("Step 2/3: Uploading image..."),
            Self::CreateListing => f.write_str("Step 3/3: Creating product entry..."),
        }
    }
}

/// Why creation stopped.
#[derive(Debug)]
pub struct CreationError {
    /// Failed step; `None` when the precondition check failed.
    pub step: Option<CreationStep>,
    pub source: ClientError,
    /// Storage key of an image that was uploaded but not attached.
    pub orphaned_key: Option<String>,
}

impl CreationError {
    fn precondition(message: &str) -> Self {
        Self {
            step: None,
            source: ClientError::validation(message),
            orphaned_key: None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// Classified message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match &self.source {
            ClientError::Validation(message) => message.clone(),
            ClientError::Backend { status, detail } => format!("Backend Error ({status}): {detail}"),
            ClientError::Network(_) => "Network or upload error. Please retry.".to_string(),
            ClientError::InvalidResponse(_) | ClientError::Session(_) => {
                "An unexpected error occurred.".to_string()
            }
        }
    }
}

impl fmt::Display for CreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_message())
    }
}

impl std::error::Error for CreationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

fn step_error(
    step: CreationStep,
    orphaned_key: Option<&str>,
) -> impl FnOnce(ClientError) -> CreationError + '_ {
    move |source| CreationError {
        step: Some(step),
        source,
        orphaned_key: orphaned_key.map(str::to_string),
    }
}

/// Runs the three creation steps.
pub struct CreationFlow<'a> {
    api: &'a ApiClient,
    progress: Option<ProgressFn>,
    on_step: Option<StepFn>,
}

impl<'a> CreationFlow<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient) -> Self {
        Self {
            api,
            progress: None,
            on_step: None,
        }
    }

    /// Observe upload progress (0-100).
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Observe step transitions.
    #[must_use]
    pub fn with_step_observer(mut self, on_step: StepFn) -> Self {
        self.on_step = Some(on_step);
        self
    }

    /// Validate the draft, then upload and create.
    ///
    /// # Errors
    ///
    /// Returns the first failure, classified, with the step it happened in.
    #[instrument(skip(self, draft, image), fields(name = %draft.name))]
    pub async fn submit(
        &self,
        draft: &ListingDraft,
        image: Option<&ImageFile>,
    ) -> Result<ListingId, CreationError> {
        let (image, price, seller_id) = Self::check(draft, image)?;
        self.report_progress(0);

        let result = self.run(draft, image, price, &seller_id).await;
        if let Err(e) = &result {
            warn!(step = ?e.step, orphaned_key = ?e.orphaned_key, error = %e.source, "Listing creation failed");
            self.report_progress(0);
        }
        result
    }

    fn check<'d>(
        draft: &ListingDraft,
        image: Option<&'d ImageFile>,
    ) -> Result<(&'d ImageFile, Price, UserId), CreationError> {
        let image = image.ok_or_else(|| CreationError::precondition(MISSING_IMAGE_MESSAGE))?;
        if [&draft.name, &draft.price, &draft.seller_id]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(CreationError::precondition(MISSING_FIELDS_MESSAGE));
        }
        let price =
            Price::parse(&draft.price).map_err(|_| CreationError::precondition(INVALID_PRICE_MESSAGE))?;
        Ok((image, price, UserId::from(draft.seller_id.trim())))
    }

    async fn run(
        &self,
        draft: &ListingDraft,
        image: &ImageFile,
        price: Price,
        seller_id: &UserId,
    ) -> Result<ListingId, CreationError> {
        self.report_step(CreationStep::RequestUploadUrl);
        let target = self
            .api
            .upload_url(&image.filename)
            .await
            .map_err(step_error(CreationStep::RequestUploadUrl, None))?;

        self.report_step(CreationStep::UploadImage);
        self.api
            .upload_image(
                &target.upload_url,
                image.bytes.clone(),
                &image.content_type,
                self.progress.clone(),
            )
            .await
            .map_err(step_error(CreationStep::UploadImage, None))?;

        self.report_step(CreationStep::CreateListing);
        let id = self
            .api
            .create_product(
                draft.name.trim(),
                price,
                draft.category.trim(),
                seller_id,
                &target.key,
            )
            .await
            .map_err(step_error(CreationStep::CreateListing, Some(&target.key)))?;

        info!(listing_id = %id, key = %target.key, "Listing created");
        Ok(id)
    }

    fn report_progress(&self, percent: u8) {
        if let Some(progress) = &self.progress {
            progress(percent);
        }
    }

    fn report_step(&self, step: CreationStep) {
        if let Some(on_step) = &self.on_step {
            on_step(step);
        }
    }
}
