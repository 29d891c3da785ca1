//! Progress rewards derived from list lengths: badges for favorites and a
//! rank for the discovery log.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub title: &'static str,
    pub emoji: &'static str,
    pub threshold: usize,
    pub earned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteBadges {
    pub count: usize,
    pub badges: Vec<Badge>,
    pub message: String,
}

const BADGES: [(&str, &str, usize); 4] = [
    ("Débutant", "🥚", 1),
    ("Explorateur", "🐛", 5),
    ("Expert", "🦋", 10),
    ("Légende", "🦅", 20),
];

/// Badges earned for a number of favorites.
pub fn favorite_badges(count: usize) -> FavoriteBadges {
    let badges = BADGES
        .iter()
        .map(|&(title, emoji, threshold)| Badge {
            title,
            emoji,
            threshold,
            earned: count >= threshold,
        })
        .collect();

    // The eagle message counts towards 25 although the badge unlocks at 20
    let message = if count < 1 {
        "Ajoutez 1 favori pour obtenir le badge Œuf !".to_string()
    } else if count < 5 {
        format!("Encore {} pour le badge Chenille !", 5 - count)
    } else if count < 10 {
        format!("Encore {} pour le badge Papillon !", 10 - count)
    } else if count < 25 {
        format!("Encore {} pour le badge Aigle !", 25 - count)
    } else {
        "Vous êtes un expert de la biodiversité !".to_string()
    };

    FavoriteBadges {
        count,
        badges,
        message,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HerbariumRank {
    pub count: usize,
    pub title: &'static str,
    pub progress_percent: f64,
    pub message: String,
}

/// Rank reached with a number of logged plants.
pub fn herbarium_rank(count: usize) -> HerbariumRank {
    let (title, goal, message) = if count < 5 {
        (
            "Graine 🌱",
            Some(5),
            format!("Encore {} plantes pour devenir une Pousse !", 5 - count),
        )
    } else if count < 10 {
        (
            "Pousse Vigoureuse 🌿",
            Some(10),
            format!("Encore {} plantes pour fleurir !", 10 - count),
        )
    } else if count < 20 {
        (
            "Fleur Épanouie 🌸",
            Some(20),
            format!("Encore {} plantes pour devenir un Arbre !", 20 - count),
        )
    } else {
        (
            "Arbre Vénérable 🌳",
            None,
            "Vous êtes un maître botaniste !".to_string(),
        )
    };

    let progress_percent = match goal {
        Some(goal) => count as f64 / goal as f64 * 100.0,
        None => 100.0,
    };

    HerbariumRank {
        count,
        title,
        progress_percent,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_favorites() {
        let badges = favorite_badges(0);
        assert!(badges.badges.iter().all(|b| !b.earned));
        assert!(badges.message.contains("Œuf"));
    }

    #[test]
    fn test_badge_thresholds() {
        let earned = |count| {
            favorite_badges(count)
                .badges
                .iter()
                .filter(|b| b.earned)
                .count()
        };
        assert_eq!(earned(1), 1);
        assert_eq!(earned(4), 1);
        assert_eq!(earned(5), 2);
        assert_eq!(earned(10), 3);
        assert_eq!(earned(20), 4);
    }

    #[test]
    fn test_badge_messages() {
        assert_eq!(favorite_badges(3).message, "Encore 2 pour le badge Chenille !");
        assert_eq!(favorite_badges(21).message, "Encore 4 pour le badge Aigle !");
        assert!(favorite_badges(25).message.contains("expert"));
    }

    #[test]
    fn test_rank_progression() {
        let rank = herbarium_rank(0);
        assert!(rank.title.starts_with("Graine"));
        assert_eq!(rank.progress_percent, 0.0);

        let rank = herbarium_rank(7);
        assert!(rank.title.starts_with("Pousse"));
        assert!((rank.progress_percent - 70.0).abs() < 1e-9);
        assert_eq!(rank.message, "Encore 3 plantes pour fleurir !");

        let rank = herbarium_rank(15);
        assert!(rank.title.starts_with("Fleur"));

        let rank = herbarium_rank(42);
        assert!(rank.title.starts_with("Arbre"));
        assert_eq!(rank.progress_percent, 100.0);
    }
}
