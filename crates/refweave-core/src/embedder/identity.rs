//! Resolution of a `$ref` url to the identity of the document it names

use url::Url;

/// Resolve `url` as written inside the document identified by `base`
///
/// Absolute urls are kept verbatim. Relative refs inside a document loaded
/// from an absolute url are joined onto it. Everything else is treated as a
/// `/`-separated path relative to the directory of `base` and normalized.
pub fn resolve_identity(base: Option<&str>, url: &str) -> String {
    if Url::parse(url).is_ok() {
        return url.to_string();
    }

    match base {
        Some(base) => match Url::parse(base) {
            Ok(base_url) => base_url
                .join(url)
                .map(|joined| joined.to_string())
                .unwrap_or_else(|_| url.to_string()),
            Err(_) if url.starts_with('/') => normalize_path(url),
            Err(_) => normalize_path(&format!("{}{}", parent_dir(base), url)),
        },
        None => normalize_path(url),
    }
}

fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[..=index],
        None => "",
    }
}

/// Drop `.` and empty segments and collapse `..` where possible
pub fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}
