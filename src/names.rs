// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Folder-qualified object names.
//!
//! Objects on the device are addressed either by a qualified path such as
//! `/Common/web_pool` or by a bare name such as `web_pool`, which resolves
//! against the currently active folder. The helpers here are the only place
//! that knows how the two forms relate.

/// Returns the folder of a qualified name, or `None` for a bare name.
///
/// ```
/// use ltmsync::names::folder_of;
///
/// assert_eq!(folder_of("/Tenant/web_pool"), Some("Tenant"));
/// assert_eq!(folder_of("web_pool"), None);
/// ```
#[must_use]
pub fn folder_of(name: &str) -> Option<&str> {
    let rest = name.strip_prefix('/')?;
    rest.split('/').next().filter(|folder| !folder.is_empty())
}

/// Strips any folder prefix, returning the object's own name.
///
/// ```
/// use ltmsync::names::strip_folder;
///
/// assert_eq!(strip_folder("/Common/10.0.0.1"), "10.0.0.1");
/// assert_eq!(strip_folder("10.0.0.1"), "10.0.0.1");
/// ```
#[must_use]
pub fn strip_folder(name: &str) -> &str {
    if name.starts_with('/') {
        name.rsplit('/').next().unwrap_or(name)
    } else {
        name
    }
}

/// Qualifies a bare name with `folder`; qualified names are returned unchanged.
#[must_use]
pub fn qualify(name: &str, folder: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{folder}/{name}")
    }
}

/// Whether a device-reported name refers to the wanted object.
///
/// Matches exactly, or when `candidate` is the wanted bare name inside any
/// folder (`/Common/web` matches `web`).
#[must_use]
pub fn matches_name(candidate: &str, wanted: &str) -> bool {
    if candidate == wanted {
        return true;
    }
    if wanted.starts_with('/') {
        return false;
    }
    candidate
        .strip_suffix(wanted)
        .is_some_and(|head| head.ends_with('/'))
}

/// Compares two names ignoring folder prefixes.
#[must_use]
pub fn same_object(left: &str, right: &str) -> bool {
    strip_folder(left) == strip_folder(right)
}
