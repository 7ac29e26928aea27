use super::handlers::{admin, health, session};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Documented JSON routes. HTML routes (`/login`, `/logout`) are added by the
/// server outside of this router.
pub(crate) fn api_router() -> OpenApiRouter {
    let mut router = OpenApiRouter::with_openapi(package_openapi())
        .routes(routes!(health::health))
        .routes(routes!(session::create, session::current, session::destroy))
        .routes(routes!(admin::landing));

    router.get_openapi_mut().tags = Some(vec![
        tag("health", "Service status"),
        tag("session", "Session cookie issuance, introspection, and revocation"),
        tag("admin", "Admin-only routes"),
    ]);

    router
}

fn tag(name: &str, description: &str) -> Tag {
    let mut tag = Tag::new(name);
    tag.description = Some(description.to_string());
    tag
}

fn package_openapi() -> utoipa::openapi::OpenApi {
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = primary_author(env!("CARGO_PKG_AUTHORS")).map(|(name, email)| {
        let mut contact = Contact::new();
        contact.name = name;
        contact.email = email;
        contact
    });

    let mut license = License::new(env!("CARGO_PKG_LICENSE"));
    license.identifier = Some(env!("CARGO_PKG_LICENSE").to_string());
    info.license = Some(license);

    OpenApiBuilder::new().info(info).build()
}

// Cargo joins authors with `:`; each may be "Name <email>".
fn primary_author(authors: &str) -> Option<(Option<String>, Option<String>)> {
    let author = authors.split(':').next()?.trim();
    if author.is_empty() {
        return None;
    }

    let non_empty = |value: &str| Some(value.trim().to_string()).filter(|v| !v.is_empty());

    match author.split_once('<') {
        Some((name, email)) => Some((non_empty(name), non_empty(email.trim_end_matches('>')))),
        None => Some((non_empty(author), None)),
    }
}
