use std::sync::LazyLock;

use serde::Serialize;

/// One navigation entry; children render as a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub title: &'static str,
    pub href: &'static str,
    #[serde(skip_serializing_if = "no_children")]
    pub children: &'static [MenuItem],
}

fn no_children(children: &&'static [MenuItem]) -> bool {
    children.is_empty()
}

impl MenuItem {
    const fn leaf(title: &'static str, href: &'static str) -> Self {
        Self {
            title,
            href,
            children: &[],
        }
    }

    /// True when `path` is this entry or one of its children.
    pub fn is_active(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        self.href == path || self.children.iter().any(|c| c.is_active(path))
    }
}

/// Public marketing navigation.
pub static MAIN_MENU: &[MenuItem] = &[
    MenuItem::leaf("Home", "/"),
    MenuItem {
        title: "Products",
        href: "/products",
        children: &[
            MenuItem::leaf("All Products", "/products"),
            MenuItem::leaf("Category 1", "/products/category-1"),
            MenuItem::leaf("Category 2", "/products/category-2"),
            MenuItem::leaf("Featured", "/products/featured"),
        ],
    },
    MenuItem {
        title: "Services",
        href: "/services",
        children: &[
            MenuItem::leaf("Service 1", "/services/service-1"),
            MenuItem::leaf("Service 2", "/services/service-2"),
            MenuItem::leaf("Consulting", "/services/consulting"),
        ],
    },
    MenuItem {
        title: "Resources",
        href: "/resources",
        children: &[
            MenuItem::leaf("Blog", "/blog"),
            MenuItem::leaf("Documentation", "/docs"),
            MenuItem::leaf("FAQ", "/faq"),
            MenuItem::leaf("Downloads", "/downloads"),
        ],
    },
    MenuItem {
        title: "Company",
        href: "/company",
        children: &[
            MenuItem::leaf("About Us", "/about"),
            MenuItem::leaf("Team", "/team"),
            MenuItem::leaf("Careers", "/careers"),
            MenuItem::leaf("News", "/news"),
        ],
    },
    MenuItem::leaf("Contact", "/contact"),
];

/// Authenticated back-office navigation.
pub static BACKOFFICE_MENU: &[MenuItem] = &[
    MenuItem::leaf("Dashboard", "/"),
    MenuItem {
        title: "Zertifikate",
        href: "/zertifikate",
        children: &[MenuItem::leaf("Zertifikat erstellen", "/zertifikate/erstellen")],
    },
    MenuItem::leaf("Einstellungen", "/user/settings"),
];

#[derive(Debug, Serialize)]
pub struct Menus {
    pub main: &'static [MenuItem],
    pub backoffice: &'static [MenuItem],
}

/// Serialized once; the trees never change at runtime.
pub static MENUS_JSON: LazyLock<String> = LazyLock::new(|| {
    serde_json::to_string(&Menus {
        main: MAIN_MENU,
        backoffice: BACKOFFICE_MENU,
    })
    .unwrap_or_else(|_| "{}".to_string())
});

/// Index of the top-level entry that should be highlighted for `path`.
pub fn active_index(menu: &[MenuItem], path: &str) -> Option<usize> {
    menu.iter().position(|item| item.is_active(path))
}
