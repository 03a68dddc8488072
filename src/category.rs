use crate::seed::SeedKind;

/// Path segment every seed link carries; category pages are reached by swapping it out.
pub const CANONICAL_PAGE: &str = "startseite";

/// The kinds of page the crawler knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Category {
    Squad,
    NationalSquad,
    AveragePoints,
    TransferBalance,
    Titles,
    ClubImage,
}

/// How a seed link is rewritten into a category request path.
///
/// `{link with CANONICAL_PAGE -> page}{suffix}{year}{after_year}`, the year
/// parts only for yearly rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathRule {
    pub page: &'static str,
    pub suffix: &'static str,
    pub after_year: &'static str,
    pub yearly: bool,
}

const SQUAD_RULE: PathRule = PathRule {
    page: "kader",
    suffix: "/plus/0/galerie/0?saison_id=",
    after_year: "",
    yearly: true,
};

const AVERAGE_POINTS_RULE: PathRule = PathRule {
    page: "leistungsdaten",
    suffix: "/plus/0?reldata=%26",
    after_year: "",
    yearly: true,
};

const TRANSFER_BALANCE_RULE: PathRule = PathRule {
    page: "transfers",
    suffix: "/plus/?saison_id=",
    after_year: "&pos=&detailpos=&w_s=",
    yearly: true,
};

const TITLES_RULE: PathRule = PathRule {
    page: "erfolge",
    suffix: "",
    after_year: "",
    yearly: false,
};

const CLUB_IMAGE_RULE: PathRule = PathRule {
    page: CANONICAL_PAGE,
    suffix: "",
    after_year: "",
    yearly: false,
};

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Squad,
        Category::NationalSquad,
        Category::AveragePoints,
        Category::TransferBalance,
        Category::Titles,
        Category::ClubImage,
    ];

    pub fn rule(self) -> &'static PathRule {
        match self {
            Category::Squad | Category::NationalSquad => &SQUAD_RULE,
            Category::AveragePoints => &AVERAGE_POINTS_RULE,
            Category::TransferBalance => &TRANSFER_BALANCE_RULE,
            Category::Titles => &TITLES_RULE,
            Category::ClubImage => &CLUB_IMAGE_RULE,
        }
    }

    pub fn is_yearly(self) -> bool {
        self.rule().yearly
    }

    /// Which seed list the category is crawled from.
    pub fn seed_kind(self) -> SeedKind {
        match self {
            Category::NationalSquad => SeedKind::NationalTeam,
            _ => SeedKind::Team,
        }
    }

    /// Rewrites a seed link into the request path for this category.
    /// `year` is ignored by per-entity rules.
    pub fn rewrite(self, link: &str, year: Option<i32>) -> String {
        let rule = self.rule();
        let mut path = link.replace(CANONICAL_PAGE, rule.page);
        path.push_str(rule.suffix);
        if let (true, Some(year)) = (rule.yearly, year) {
            path.push_str(&year.to_string());
            path.push_str(rule.after_year);
        }
        path
    }
}
