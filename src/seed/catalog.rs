//! Built-in finance category catalog used when no plan file is configured.

use crate::domain::CategoryType;

use super::tree::{ChildSeed, RootSeed, SeedPlan};

const ROOTS: &[(&str, &str)] = &[
    ("leadership", "فريق القيادة"),
    ("technical", "الفريق التقني"),
    ("content", "فريق المحتوى"),
    ("marketing-sales", "التسويق والمبيعات"),
    ("operations", "الفريق التشغيلي"),
    ("infrastructure", "البنية التحتية والتقنية"),
    ("overhead", "المصروفات الإدارية"),
    ("marketing", "التسويق والإعلان"),
];

/// Children grouped by parent slug; order is the position within the group.
const CHILDREN: &[(&str, &[(&str, &str)])] = &[
    (
        "infrastructure",
        &[
            ("hosting", "الاستضافة"),
            ("database", "قاعدة البيانات"),
            ("storage", "التخزين"),
            ("seo-tools", "أدوات SEO"),
            ("analytics", "التحليلات"),
            ("development", "أدوات التطوير"),
            ("monitoring", "المراقبة"),
            ("project-management", "إدارة المشاريع"),
            ("domain", "النطاق و SSL"),
            ("email", "خدمة البريد الإلكتروني"),
        ],
    ),
    (
        "overhead",
        &[
            ("office", "إيجار المكتب"),
            ("utilities", "المرافق والإنترنت"),
            ("legal", "التأمين والقانوني"),
            ("misc", "مصروفات إدارية متنوعة"),
        ],
    ),
    ("marketing", &[("media", "الإعلانات")]),
    ("marketing-sales", &[("sales", "المبيعات")]),
];

impl SeedPlan {
    /// The expense tree every fresh installation starts from.
    pub fn default_catalog() -> Self {
        let roots = ROOTS
            .iter()
            .zip(1..)
            .map(|(&(slug, label), order)| RootSeed {
                slug: slug.into(),
                label: label.into(),
                kind: CategoryType::Expense,
                order,
            })
            .collect();
        let children = CHILDREN
            .iter()
            .flat_map(|&(parent_slug, nodes)| {
                nodes.iter().zip(1..).map(move |(&(slug, label), order)| ChildSeed {
                    slug: slug.into(),
                    label: label.into(),
                    parent_slug: parent_slug.into(),
                    kind: CategoryType::Expense,
                    order,
                })
            })
            .collect();
        Self { roots, children }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_is_valid() {
        let plan = SeedPlan::default_catalog();
        assert!(plan.validate().is_empty());
        assert_eq!(plan.roots.len(), 8);
        assert_eq!(plan.children.len(), 16);
        assert!(plan
            .children
            .iter()
            .all(|child| plan.roots.iter().any(|root| root.slug == child.parent_slug)));
    }

    #[test]
    fn orders_restart_per_parent() {
        let plan = SeedPlan::default_catalog();
        let media = plan.children.iter().find(|c| c.slug == "media").unwrap();
        assert_eq!(media.order, 1);
        let email = plan.children.iter().find(|c| c.slug == "email").unwrap();
        assert_eq!(email.order, 10);
    }
}
