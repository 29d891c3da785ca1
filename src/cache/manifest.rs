//! Static asset manifest cached at install time.

/// Same-origin paths stored in every version partition.
pub const STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/favoris.html",
    "/camera.html",
    "/carte.html",
    "/carnet.html",
    "/service_worker.js",
    "/css/style.css",
    // scripts
    "/js/globals.js",
    "/js/utils.js",
    "/js/logic.js",
    "/js/main.js",
    "/js/pwa.js",
    "/lib/bootstrap.min.css",
    "/favicon/site.webmanifest",
    "/favicon/favicon.ico",
    // icon font
    "/lib/bootstrap-icons-1.13.1/bootstrap-icons.css",
    "/lib/bootstrap-icons-1.13.1/fonts/bootstrap-icons.woff",
    "/lib/bootstrap-icons-1.13.1/fonts/bootstrap-icons.woff2",
    // map library
    "/lib/leaflet/leaflet.js",
    "/lib/leaflet/leaflet.css",
    "/lib/leaflet/images/marker-icon.png",
    "/lib/leaflet/images/marker-shadow.png",
    "/lib/leaflet/images/marker-icon-2x.png",
    // media
    "/img/wet_owl.jpg",
    "/audio/gnomed.mp3",
];

/// The default manifest as owned strings.
pub fn default_manifest() -> Vec<String> {
    STATIC_ASSETS.iter().map(|path| path.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_manifest_paths_are_absolute_and_unique() {
        let unique: HashSet<_> = STATIC_ASSETS.iter().collect();
        assert_eq!(unique.len(), STATIC_ASSETS.len());
        assert!(STATIC_ASSETS.iter().all(|p| p.starts_with('/')));
    }
}
