//! Conservation, capacity, atomicity, idempotence and exactly-once
//! properties of the simulation.

#![allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use std::sync::Arc;

use rust_decimal_macros::dec;
use tycoon_catalog::standard_catalog;
use tycoon_core::{CommandError, Game, GameConfig};
use tycoon_factory::{Factory, FactoryError};
use tycoon_ledger::EntryType;
use tycoon_types::{ContractStatus, FactoryId, Term};

fn game(yaml: &str) -> (Game, FactoryId, FactoryId) {
    let config = GameConfig::parse(yaml).unwrap();
    let catalog = Arc::new(config.build_catalog().unwrap());
    let game = Game::new(catalog, &config).unwrap();
    let seats = game.seats().to_vec();
    (game, seats[0], seats[1])
}

#[test]
fn transfers_conserve_totals() {
    let (mut game, ada, bob) = game(
        r"
game:
  players:
    - { name: Ada, balances: { Copper: 7, Iron: 1 } }
    - { name: Bob, balances: { Copper: 1, Iron: 4 } }
",
    );
    let copper = game.catalog().resource_by_name("Copper").unwrap().id;
    let iron = game.catalog().resource_by_name("Iron").unwrap().id;
    let total = |g: &Game, r| g.factory(ada).unwrap().balance(r) + g.factory(bob).unwrap().balance(r);
    let before = (total(&game, copper), total(&game, iron));

    game.request_propose_contract(
        ada,
        bob,
        vec![Term::new(dec!(4), copper)],
        vec![Term::new(dec!(2.5), iron)],
        2,
    )
    .unwrap();
    game.request_advance_turn().unwrap();
    game.request_accept_contract(bob).unwrap();
    let report = game.request_advance_turn().unwrap();

    assert_eq!(report.settlements[0].transfers.len(), 2);
    assert!(report.conservation.is_balanced());
    assert_eq!((total(&game, copper), total(&game, iron)), before);
    assert_eq!(game.factory(ada).unwrap().balance(copper), dec!(3));
    assert_eq!(game.factory(bob).unwrap().balance(iron), dec!(1.5));
}

#[test]
fn purchase_never_exceeds_capacity() {
    let (mut game, ada, _) = game(
        r"
game:
  players:
    - { name: Ada, balances: { Copper: 10 }, fixtures: [Copper Mine, Blocked Slot] }
    - { name: Bob }
factory:
  capacity: 2
",
    );
    let mine = game.catalog().lookup_by_name("Copper Mine").unwrap().id;
    let before = game.balances(ada).unwrap();

    let result = game.request_purchase(ada, mine);
    assert!(matches!(
        result,
        Err(CommandError::Factory(FactoryError::CapacityExceeded { capacity: 2 }))
    ));
    assert_eq!(game.balances(ada).unwrap(), before);
    assert_eq!(game.units(ada).unwrap().len(), 2);
}

#[test]
fn failed_multi_line_purchase_debits_nothing() {
    let (mut game, ada, _) = game(
        r"
game:
  players:
    - { name: Ada, balances: { Copper: 10, Iron: 1 } }
    - { name: Bob }
",
    );
    let deep = game.catalog().lookup_by_name("Deep Copper Mine").unwrap().id;
    let before = game.balances(ada).unwrap();

    assert!(game.request_purchase(ada, deep).is_err());
    assert_eq!(game.balances(ada).unwrap(), before);
    assert!(
        game.journal()
            .entries()
            .iter()
            .all(|e| e.entry_type != EntryType::Purchase)
    );
}

#[test]
fn successful_purchase_is_journaled_per_cost_line() {
    let (mut game, ada, _) = game(
        r"
game:
  players:
    - { name: Ada, balances: { Copper: 10, Iron: 2 } }
    - { name: Bob }
",
    );
    let deep = game.catalog().lookup_by_name("Deep Copper Mine").unwrap().id;
    game.request_purchase(ada, deep).unwrap();

    let purchases = game
        .journal()
        .entries()
        .iter()
        .filter(|e| e.entry_type == EntryType::Purchase)
        .count();
    assert_eq!(purchases, 2);
}

#[test]
fn collection_is_idempotent() {
    let catalog = standard_catalog().unwrap();
    let mine = catalog.lookup_by_name("Copper Mine").unwrap().id;
    let mut factory = Factory::new("Ada", 4, &catalog);
    factory.place_fixture(&catalog, mine).unwrap();
    factory.tick().unwrap();

    assert!(!factory.collect().unwrap().is_empty());
    let once = factory.balances().snapshot();
    assert!(factory.collect().unwrap().is_empty());
    assert_eq!(factory.balances().snapshot(), once);
}

#[test]
fn contract_settles_exactly_once() {
    let (mut game, ada, bob) = game(
        r"
game:
  players:
    - { name: Ada, balances: { Copper: 9 } }
    - { name: Bob, balances: {} }
",
    );
    let copper = game.catalog().resource_by_name("Copper").unwrap().id;
    let id = game
        .request_propose_contract(ada, bob, vec![Term::new(dec!(3), copper)], Vec::new(), 2)
        .unwrap();
    game.request_advance_turn().unwrap();
    game.request_accept_contract(bob).unwrap();

    let mut settlements = 0;
    for _ in 0..8 {
        settlements += game.request_advance_turn().unwrap().settlements.len();
    }
    assert_eq!(settlements, 1);
    assert_eq!(game.contract(id).unwrap().status(), ContractStatus::Settled);
    assert_eq!(game.factory(ada).unwrap().balance(copper), dec!(6));
    assert_eq!(game.factory(bob).unwrap().balance(copper), dec!(3));
    assert_eq!(game.factory(ada).unwrap().contracts(), &[id]);
    assert!(game.contracts_for(ada).unwrap().is_empty());
    assert_eq!(game.blocked_turns(ada).unwrap(), 0);
}
