use crate::models::UserRole;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct NavSection {
    pub title: &'static str,
    pub items: Vec<NavItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Navigation {
    pub role: Option<UserRole>,
    pub sections: Vec<NavSection>,
}

const fn item(label: &'static str, path: &'static str) -> NavItem {
    NavItem { label, path }
}

fn portal_section() -> NavSection {
    NavSection {
        title: "Portal",
        items: vec![
            item("Beranda", "/"),
            item("Direktori Alumni", "/members"),
            item("Acara", "/events"),
            item("Galeri", "/gallery"),
            item("Forum", "/forum"),
            item("Artikel", "/articles"),
        ],
    }
}

fn member_section() -> NavSection {
    NavSection {
        title: "Akun Saya",
        items: vec![
            item("Profil", "/profile"),
            item("Acara Saya", "/my/events"),
            item("Galeri Saya", "/my/gallery"),
            item("Notifikasi", "/notifications"),
        ],
    }
}

fn admin_section() -> NavSection {
    NavSection {
        title: "Administrasi",
        items: vec![
            item("Dasbor", "/admin"),
            item("Kelola Acara", "/admin/events"),
            item("Moderasi Galeri", "/admin/gallery"),
            item("Laporan Forum", "/admin/reports"),
            item("Kategori Forum", "/admin/categories"),
            item("Artikel", "/admin/articles"),
            item("Anggota", "/admin/users"),
        ],
    }
}

/// Menu for a viewer. Guests (and banned accounts) get the public portal
/// only; members add their own pages; admins add the admin area.
pub fn navigation_for(role: Option<UserRole>) -> Navigation {
    let sections = match role {
        Some(UserRole::Admin) => vec![portal_section(), member_section(), admin_section()],
        Some(UserRole::Alumni) => vec![portal_section(), member_section()],
        Some(UserRole::Banned) | None => vec![portal_section()],
    };
    Navigation { role, sections }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(nav: &Navigation) -> Vec<&'static str> {
        nav.sections
            .iter()
            .flat_map(|s| s.items.iter().map(|i| i.path))
            .collect()
    }

    #[test]
    fn guests_see_only_public_pages() {
        let nav = navigation_for(None);
        assert_eq!(nav.sections.len(), 1);
        assert!(!paths(&nav).iter().any(|p| p.starts_with("/my") || p.starts_with("/admin")));
    }

    #[test]
    fn alumni_get_their_own_pages_but_no_admin_area() {
        let paths = paths(&navigation_for(Some(UserRole::Alumni)));
        assert!(paths.contains(&"/my/events"));
        assert!(!paths.iter().any(|p| p.starts_with("/admin")));
    }

    #[test]
    fn admins_get_everything() {
        let nav = navigation_for(Some(UserRole::Admin));
        assert_eq!(nav.sections.last().map(|s| s.title), Some("Administrasi"));
        assert!(paths(&nav).contains(&"/admin/reports"));
    }

    #[test]
    fn banned_accounts_fall_back_to_guest_menu() {
        assert_eq!(
            navigation_for(Some(UserRole::Banned)).sections,
            navigation_for(None).sections
        );
    }

    #[test]
    fn pure_function() {
        assert_eq!(
            navigation_for(Some(UserRole::Admin)),
            navigation_for(Some(UserRole::Admin))
        );
    }
}
