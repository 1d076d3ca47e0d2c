use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Numéros tirables : 1..=45.
pub const POOL_SIZE: usize = 45;
/// Numéros principaux par tirage.
pub const PICK_COUNT: usize = 6;

/// Un tirage historique : 6 numéros principaux + 1 numéro bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub draw_index: u32,
    pub date: String,
    pub numbers: [u8; PICK_COUNT],
    pub bonus: u8,
}

impl DrawRecord {
    /// Valide puis construit un tirage. Les numéros principaux sont stockés triés.
    pub fn new(draw_index: u32, date: impl Into<String>, numbers: [u8; PICK_COUNT], bonus: u8) -> Result<Self> {
        validate_draw(draw_index, &numbers, bonus)?;
        let mut numbers = numbers;
        numbers.sort();
        Ok(Self { draw_index, date: date.into(), numbers, bonus })
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    pub fn is_bonus(&self, number: u8) -> bool {
        self.bonus == number
    }
}

pub fn validate_draw(draw_index: u32, numbers: &[u8; PICK_COUNT], bonus: u8) -> Result<()> {
    if draw_index < 1 {
        bail!("Numéro de tirage invalide : {}", draw_index);
    }
    for &n in numbers {
        if n < 1 || n as usize > POOL_SIZE {
            bail!("Numéro {} hors limites (1-{})", n, POOL_SIZE);
        }
    }
    if bonus < 1 || bonus as usize > POOL_SIZE {
        bail!("Bonus {} hors limites (1-{})", bonus, POOL_SIZE);
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Numéro en double : {}", numbers[i]);
            }
        }
    }
    if numbers.contains(&bonus) {
        bail!("Le bonus {} figure déjà parmi les numéros principaux", bonus);
    }
    Ok(())
}

/// Rang de gain, du meilleur au pire. L'ordre des variantes est l'ordre total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    None,
}

impl Rank {
    /// Compare une grille prédite au tirage réel.
    /// 6 bons = 1er, 5 + bonus = 2e, 5 = 3e, 4 = 4e, 3 = 5e, sinon perdu.
    pub fn determine(predicted: &[u8], actual: &DrawRecord) -> Rank {
        let match_count = actual.numbers.iter().filter(|n| predicted.contains(n)).count();
        let bonus_hit = predicted.contains(&actual.bonus);

        match match_count {
            6 => Rank::First,
            5 if bonus_hit => Rank::Second,
            5 => Rank::Third,
            4 => Rank::Fourth,
            3 => Rank::Fifth,
            _ => Rank::None,
        }
    }

    pub fn is_win(&self) -> bool {
        *self != Rank::None
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::First => write!(f, "1er rang"),
            Rank::Second => write!(f, "2e rang"),
            Rank::Third => write!(f, "3e rang"),
            Rank::Fourth => write!(f, "4e rang"),
            Rank::Fifth => write!(f, "5e rang"),
            Rank::None => write!(f, "perdu"),
        }
    }
}

pub fn format_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actual() -> DrawRecord {
        DrawRecord::new(1, "2024-01-06", [1, 2, 3, 4, 5, 6], 7).unwrap()
    }

    #[test]
    fn test_validate_draw_ok() {
        assert!(validate_draw(1, &[1, 2, 3, 4, 5, 6], 7).is_ok());
        assert!(validate_draw(1200, &[45, 44, 43, 42, 41, 40], 1).is_ok());
    }

    #[test]
    fn test_validate_draw_out_of_range() {
        assert!(validate_draw(1, &[0, 2, 3, 4, 5, 6], 7).is_err());
        assert!(validate_draw(1, &[1, 2, 3, 4, 5, 46], 7).is_err());
        assert!(validate_draw(1, &[1, 2, 3, 4, 5, 6], 46).is_err());
        assert!(validate_draw(0, &[1, 2, 3, 4, 5, 6], 7).is_err());
    }

    #[test]
    fn test_validate_draw_duplicates() {
        assert!(validate_draw(1, &[1, 1, 3, 4, 5, 6], 7).is_err());
    }

    #[test]
    fn test_validate_draw_bonus_in_main() {
        assert!(validate_draw(1, &[1, 2, 3, 4, 5, 6], 6).is_err());
    }

    #[test]
    fn test_new_sorts_numbers() {
        let draw = DrawRecord::new(3, "", [40, 2, 33, 4, 15, 6], 7).unwrap();
        assert_eq!(draw.numbers, [2, 4, 6, 15, 33, 40]);
        assert!(draw.contains(33));
        assert!(!draw.contains(7));
        assert!(draw.is_bonus(7));
    }

    #[test]
    fn test_rank_first_second_third() {
        let actual = actual();
        assert_eq!(Rank::determine(&[1, 2, 3, 4, 5, 6], &actual), Rank::First);
        assert_eq!(Rank::determine(&[1, 2, 3, 4, 5, 7], &actual), Rank::Second);
        assert_eq!(Rank::determine(&[1, 2, 3, 4, 5, 8], &actual), Rank::Third);
    }

    #[test]
    fn test_rank_lower_tiers() {
        let actual = actual();
        assert_eq!(Rank::determine(&[1, 2, 3, 4, 8, 9], &actual), Rank::Fourth);
        assert_eq!(Rank::determine(&[1, 2, 3, 7, 8, 9], &actual), Rank::Fifth);
        assert_eq!(Rank::determine(&[1, 2, 7, 8, 9, 10], &actual), Rank::None);
        assert_eq!(Rank::determine(&[40, 41, 42, 43, 44, 45], &actual), Rank::None);
    }

    #[test]
    fn test_rank_bonus_only_matters_for_five() {
        let actual = actual();
        // 4 bons + bonus reste un 4e rang
        assert_eq!(Rank::determine(&[1, 2, 3, 4, 7, 9], &actual), Rank::Fourth);
    }

    #[test]
    fn test_rank_order() {
        assert!(Rank::First < Rank::Second);
        assert!(Rank::Fifth < Rank::None);
        let mut ranks = vec![Rank::None, Rank::Third, Rank::First, Rank::Fifth];
        ranks.sort();
        assert_eq!(ranks, vec![Rank::First, Rank::Third, Rank::Fifth, Rank::None]);
        assert!(!Rank::None.is_win());
        assert!(Rank::Fifth.is_win());
    }

    #[test]
    fn test_rank_determined_by_match_count() {
        let actual = actual();
        // Toutes les grilles de 6 numéros parmi 1..=12 : le rang ne dépend que du nombre de bons
        let pool: Vec<u8> = (1..=12).collect();
        let mut checked = 0;
        for mask in 0u32..(1 << 12) {
            if mask.count_ones() != 6 {
                continue;
            }
            let grid: Vec<u8> = pool.iter().enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, &n)| n)
                .collect();
            let matches = grid.iter().filter(|n| actual.contains(**n)).count();
            let rank = Rank::determine(&grid, &actual);
            let expected = match matches {
                6 => Rank::First,
                5 if grid.contains(&7) => Rank::Second,
                5 => Rank::Third,
                4 => Rank::Fourth,
                3 => Rank::Fifth,
                _ => Rank::None,
            };
            assert_eq!(rank, expected, "grille {:?}", grid);
            checked += 1;
        }
        assert_eq!(checked, 924);
    }

    #[test]
    fn test_format_numbers() {
        assert_eq!(format_numbers(&[1, 12, 45]), " 1 - 12 - 45");
    }

    #[test]
    fn test_draw_serde_roundtrip() {
        let draw = actual();
        let json = serde_json::to_string(&draw).unwrap();
        let restored: DrawRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, draw);
    }
}
