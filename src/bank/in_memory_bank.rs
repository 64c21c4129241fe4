use std::collections::HashMap;

use crate::directory::AccountDirectory;

use super::{AuthError, Bank, CardNumber};

/// Fixed set of cards held in memory. Cards cannot be added or removed after
/// construction, only their balances change.
#[derive(Debug, Default)]
pub struct BankRegistry {
    cards: HashMap<CardNumber, AccountDirectory>,
}

impl BankRegistry {
    pub fn new(cards: HashMap<CardNumber, AccountDirectory>) -> Self {
        Self { cards }
    }

    pub fn directory(&self, card: CardNumber) -> Option<&AccountDirectory> {
        self.cards.get(&card)
    }

    /// All cards ordered by card number.
    pub fn cards(&self) -> impl Iterator<Item = (CardNumber, &AccountDirectory)> {
        let mut cards: Vec<_> = self.cards.iter().map(|(card, dir)| (*card, dir)).collect();
        cards.sort_unstable_by_key(|(card, _)| *card);
        cards.into_iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl FromIterator<(CardNumber, AccountDirectory)> for BankRegistry {
    fn from_iter<T: IntoIterator<Item = (CardNumber, AccountDirectory)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Bank for BankRegistry {
    fn card_exists(&self, card: CardNumber) -> bool {
        self.cards.contains_key(&card)
    }

    fn check_pin(&self, card: CardNumber, pin: &str) -> Result<&AccountDirectory, AuthError> {
        let dir = self.cards.get(&card).ok_or(AuthError::NoSuchCard(card))?;
        if dir.pin_matches(pin) {
            Ok(dir)
        } else {
            Err(AuthError::WrongPin)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BankRegistry {
        BankRegistry::from_iter([
            (
                123123123,
                AccountDirectory::new("1234", [("main", 2000), ("second", 150)]).unwrap(),
            ),
            (
                123456789,
                AccountDirectory::new("9999", [("main", 10000)]).unwrap(),
            ),
        ])
    }

    #[test]
    fn lookup_cards() {
        let bank = registry();
        assert_eq!(bank.len(), 2);
        assert!(bank.card_exists(123123123));
        assert!(bank.card_exists(123456789));
        assert!(!bank.card_exists(1));
        assert!(BankRegistry::default().is_empty());

        let cards: Vec<_> = bank.cards().map(|(card, _)| card).collect();
        assert_eq!(cards, vec![123123123, 123456789]);
    }

    #[test]
    fn check_pin() {
        let bank = registry();

        let dir = bank.check_pin(123123123, "1234").unwrap();
        assert_eq!(dir.balance("second"), Some(150));

        assert_eq!(
            bank.check_pin(123123123, "9999").unwrap_err(),
            AuthError::WrongPin
        );
        assert_eq!(
            bank.check_pin(42, "1234").unwrap_err(),
            AuthError::NoSuchCard(42)
        );
        assert_eq!(
            AuthError::NoSuchCard(42).to_string(),
            "Card 42 does not exist in bank database"
        );
    }

    #[test]
    fn returned_directory_is_the_stored_one() {
        let bank = registry();
        let dir = bank.check_pin(123456789, "9999").unwrap();
        dir.execute(
            "main",
            crate::command::TransactionCommand::withdraw(100).unwrap(),
        )
        .unwrap();
        assert_eq!(
            bank.directory(123456789).unwrap().balance("main"),
            Some(9900)
        );
    }
}
