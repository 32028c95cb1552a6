use crate::infra::{InMemoryBlobStore, InMemoryUserRepository};
use clap::Args;
use crushisen::error::AppError;
use crushisen::workflows::registration::{
    LookupFailurePolicy, PhotoReference, ProfileSubmission, RegistrationError,
    RegistrationService, RegistrationSettings,
};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Pseudo to register.
    #[arg(long, default_value = "camille_m")]
    pub(crate) pseudo: String,
    /// Email to register.
    #[arg(long, default_value = "camille.mullot@isen.fr")]
    pub(crate) email: String,
    /// Password (also used as the confirmation).
    #[arg(long, default_value = "Abcdefghi1@")]
    pub(crate) password: String,
    /// Skip the photo picker step to watch the first gate reject the form.
    #[arg(long)]
    pub(crate) without_photo: bool,
    /// Treat failed uniqueness lookups as free instead of aborting.
    #[arg(long)]
    pub(crate) fail_open: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        pseudo,
        email,
        password,
        without_photo,
        fail_open,
    } = args;

    let settings = RegistrationSettings {
        lookup_policy: if fail_open {
            LookupFailurePolicy::FailOpen
        } else {
            LookupFailurePolicy::FailClosed
        },
        ..RegistrationSettings::default()
    };
    let repository = Arc::new(InMemoryUserRepository::default());
    let blobs = Arc::new(InMemoryBlobStore::new("http://localhost:3000/storage"));
    let service = RegistrationService::new(repository, blobs.clone(), settings);

    println!("CrushIsen sign-up demo");
    let submission = demo_submission(pseudo, email, password, without_photo);

    let registration = match service.register(submission.clone()).await {
        Ok(registration) => registration,
        Err(RegistrationError::Validation(failure)) => {
            println!("- Form rejected [{}]: {}", failure.code(), failure);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let receipt = registration.receipt;
    println!(
        "- Account {} created for {} <{}>",
        receipt.user_id, receipt.pseudo, receipt.email
    );

    match registration.photo_upload.await {
        Ok(Ok(url)) => println!("  Profile photo stored at {}", url),
        Ok(Err(err)) => println!("  Profile photo not attached: {}", err),
        Err(err) => println!("  Photo task aborted: {}", err),
    }
    println!("  Blobs stored: {}", blobs.object_count());

    match service.get(&receipt.user_id).await {
        Ok(record) => match serde_json::to_string_pretty(&record.view()) {
            Ok(json) => println!("  Stored profile:\n{}", json),
            Err(err) => println!("  Stored profile unavailable: {}", err),
        },
        Err(err) => println!("  Repository lookup failed: {}", err),
    }

    println!("\nSecond attempt with the same details");
    match service.register(submission.clone()).await {
        Ok(_) => println!("- Unexpectedly accepted a duplicate account"),
        Err(RegistrationError::Validation(failure)) => {
            println!("- Rejected [{}]: {}", failure.code(), failure)
        }
        Err(err) => println!("- Aborted: {}", err),
    }

    println!("\nSign-in");
    for identifier in [&submission.pseudo, &submission.email] {
        match service
            .authenticate(identifier, &submission.password)
            .await
        {
            Ok(view) => println!("- {} -> signed in as {}", identifier, view.user_id),
            Err(err) => println!("- {} -> {}", identifier, err),
        }
    }

    Ok(())
}

fn demo_submission(
    pseudo: String,
    email: String,
    password: String,
    without_photo: bool,
) -> ProfileSubmission {
    ProfileSubmission {
        last_name: "Mullot".to_string(),
        first_name: "Camille".to_string(),
        pseudo,
        email,
        address: "41 boulevard Vauban, Lille".to_string(),
        date_of_birth: "14/03/2003".to_string(),
        phone_number: "0612345678".to_string(),
        school_year: "M1".to_string(),
        description: "Climbing, jazz and late-night robotics.".to_string(),
        password_confirmation: password.clone(),
        password,
        photo: (!without_photo).then(|| {
            PhotoReference("content://media/external/images/media/42".to_string())
        }),
    }
}
