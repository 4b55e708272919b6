//! Deterministic names derived from an image reference.
//!
//! Image references like `ghcr.io/org/app:1.2` carry `:` and `/`, which are
//! not valid in container names, file names or bundle identifiers.

const NAME_PREFIX: &str = "dock2tauri";

/// Characters stripped from product names so they stay file-system safe.
const UNSAFE_FILE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Container name for an image bound to `host_port`.
///
/// `nginx:alpine` on 8088 becomes `dock2tauri-nginx-alpine-8088`.
pub fn instance_name(image: &str, host_port: u16) -> String {
    format!("{NAME_PREFIX}-{}-{host_port}", sanitize_image(image))
}

/// Replace every character Docker rejects in a container name with `-`.
pub fn sanitize_image(image: &str) -> String {
    image
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Image name with the tag and digest dropped.
///
/// A `:` only starts a tag when it comes after the last `/`, so registry
/// ports (`localhost:5000/app`) survive.
pub fn image_name(image: &str) -> &str {
    let image = image.split('@').next().unwrap_or(image);
    let last_slash = image.rfind('/').map_or(0, |i| i + 1);
    match image[last_slash..].find(':') {
        Some(colon) => &image[..last_slash + colon],
        None => image,
    }
}

/// Image name safe to embed in a product name or file name.
pub fn product_slug(image: &str) -> String {
    image_name(image)
        .chars()
        .filter(|c| !UNSAFE_FILE_CHARS.contains(c))
        .collect()
}

/// Alphanumeric-only form of the full reference, for bundle identifiers.
pub fn identifier_slug(image: &str) -> String {
    let slug: String = image.chars().filter(char::is_ascii_alphanumeric).collect();
    if slug.is_empty() {
        "app".to_string()
    } else {
        slug
    }
}
