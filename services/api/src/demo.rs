use crate::infra::{
    InMemoryApplicationRepository, InMemoryDocumentStore, InMemoryNotificationQueue,
    InMemoryUserDirectory,
};
use clap::Args;
use sellerflow::error::AppError;
use sellerflow::workflows::onboarding::applications::{
    AccountRole, ApplicationStatus, ApplicationSubmission, DocumentSelector, IdDocumentType,
    PageLimits, ReviewError, ReviewService, SellerApplication, UserId,
};
use std::sync::Arc;

type DemoService = ReviewService<
    InMemoryApplicationRepository,
    InMemoryUserDirectory,
    InMemoryDocumentStore,
    InMemoryNotificationQueue,
>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Page size used when listing the pending review queue.
    #[arg(long)]
    pub(crate) queue_limit: Option<usize>,
    /// Stop after the submission portion of the demo.
    #[arg(long)]
    pub(crate) skip_decisions: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        queue_limit,
        skip_decisions,
    } = args;

    println!("Seller application review demo");
    println!("As of {}", chrono::Utc::now().format("%Y-%m-%d %H:%M UTC"));

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let directory = Arc::new(InMemoryUserDirectory::default());
    let documents = Arc::new(InMemoryDocumentStore::default());
    let notifications = Arc::new(InMemoryNotificationQueue::default());

    directory.add_account("buyer-olive", AccountRole::Buyer);
    directory.add_account("buyer-theo", AccountRole::Buyer);
    directory.add_account("admin-ada", AccountRole::Administrator);

    let service: Arc<DemoService> = Arc::new(ReviewService::new(
        repository,
        directory.clone(),
        documents.clone(),
        notifications.clone(),
        PageLimits::default(),
    ));

    println!("\nUploading identity documents");
    let olive_passport = upload(&documents, "passport.pdf", b"%PDF olive passport")?;
    let olive_registry = upload(&documents, "business-registration.pdf", b"%PDF registry")?;
    let theo_license = upload(&documents, "drivers-license.jpg", b"jpeg bytes")?;
    println!("- stored {olive_passport}, {olive_registry}, {theo_license}");

    println!("\nSubmitting applications");
    let olive = service.submit(ApplicationSubmission {
        applicant_id: UserId("buyer-olive".to_string()),
        business_description: "Handmade ceramics and tableware".to_string(),
        business_type: Some("sole_proprietor".to_string()),
        id_document_type: IdDocumentType::Passport,
        id_document_ref: olive_passport,
        additional_document_refs: vec![olive_registry],
    })?;
    render_record("buyer-olive", &olive);

    let theo = service.submit(ApplicationSubmission {
        applicant_id: UserId("buyer-theo".to_string()),
        business_description: "Vintage vinyl records".to_string(),
        business_type: None,
        id_document_type: IdDocumentType::DriversLicense,
        id_document_ref: theo_license,
        additional_document_refs: Vec::new(),
    })?;
    render_record("buyer-theo", &theo);

    match service.submit(ApplicationSubmission {
        applicant_id: UserId("buyer-olive".to_string()),
        business_description: "Second storefront".to_string(),
        business_type: None,
        id_document_type: IdDocumentType::NationalId,
        id_document_ref: "doc-000000".to_string(),
        additional_document_refs: Vec::new(),
    }) {
        Err(err) => println!("- duplicate submission refused: {err}"),
        Ok(_) => println!("- duplicate submission unexpectedly accepted"),
    }

    println!("\nPending review queue");
    let queue = service.list(Some(ApplicationStatus::Pending), None, queue_limit)?;
    println!(
        "- showing {} of {} pending (limit {})",
        queue.items.len(),
        queue.total,
        queue.limit
    );
    for record in &queue.items {
        println!("  - {} from {}", record.id, record.applicant_id);
    }

    println!("\nFetching the identity document under review");
    let document = service.download_document(&olive.id, DocumentSelector::IdDocument)?;
    println!(
        "- {} ({}, {} bytes)",
        document.file_name,
        document.serve_content_type(),
        document.bytes.len()
    );

    if skip_decisions {
        return Ok(());
    }

    let admin = UserId("admin-ada".to_string());

    println!("\nReviewing");
    println!(
        "- buyer-olive role before approval: {}",
        role_label(&directory, "buyer-olive")
    );
    let approved = service.approve(&olive.id, &admin, Some("documents verified".to_string()))?;
    println!("- {} approved: {}", approved.id, approved.decision_summary());
    println!(
        "- buyer-olive role after approval: {}",
        role_label(&directory, "buyer-olive")
    );

    let rejected = service.reject(&theo.id, &admin, "identity document is expired")?;
    println!("- {} rejected: {}", rejected.id, rejected.decision_summary());
    println!(
        "- buyer-theo role is unchanged: {}",
        role_label(&directory, "buyer-theo")
    );

    match service.reject(&olive.id, &admin, "second thoughts") {
        Err(ReviewError::AlreadyReviewed { .. }) => {
            println!("- re-deciding {} refused: decisions are final", olive.id);
        }
        other => println!("- unexpected outcome re-deciding {}: {other:?}", olive.id),
    }

    println!("\nApplicant notifications");
    for notice in notifications.events() {
        match &notice.notes {
            Some(notes) => println!(
                "- {} <- {} ({notes})",
                notice.user_id,
                notice.kind.label()
            ),
            None => println!("- {} <- {}", notice.user_id, notice.kind.label()),
        }
    }

    println!("\nHistory for buyer-olive");
    for record in service.history_for(&UserId("buyer-olive".to_string()))? {
        println!(
            "- {} [{}] {}",
            record.id,
            record.status.label(),
            record.decision_summary()
        );
    }

    Ok(())
}

fn upload(
    documents: &InMemoryDocumentStore,
    file_name: &str,
    bytes: &[u8],
) -> Result<String, AppError> {
    Ok(documents
        .store_named(file_name, bytes.to_vec())
        .map_err(ReviewError::from)?)
}

fn render_record(applicant: &str, record: &SellerApplication) {
    println!(
        "- {applicant}: {} ({}, identity via {}, submitted {})",
        record.id,
        record.status.label(),
        record.id_document_type.label(),
        record.submitted_at.format("%Y-%m-%d %H:%M UTC")
    );
}

fn role_label(directory: &InMemoryUserDirectory, user: &str) -> &'static str {
    directory.role(user).map_or("unknown", AccountRole::label)
}
