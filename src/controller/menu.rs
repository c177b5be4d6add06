//! Menus as data: each item carries its action and any bound parameter.

use crate::session::SessionState;
use crate::wallet::Network;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    GenerateKey,
    EnterPhrase,
    LoadKey,
    ConfirmKey,
    RegenerateKey,
    Wallets,
    ShowWallet(usize),
    MasterKeys,
    ShowMasterKey(usize),
    SignTransaction,
    VerifyAddress,
    ChangePassword,
    NetworkMenu,
    SelectNetwork(Network),
    Reckless,
    ShowPhrase,
    SaveKey,
    DeleteKey,
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub action: MenuAction,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, action: MenuAction) -> Self {
        Self { label: label.into(), action }
    }
}

/// Which screen the operator is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuId {
    Init,
    NewKey,
    Main,
    Wallets,
    MasterKeys,
    Networks,
    Reckless,
}

impl MenuId {
    pub fn title(&self) -> &'static str {
        match self {
            MenuId::Init => "What do you want to do?",
            MenuId::NewKey => "Your recovery phrase",
            MenuId::Main => "What do you want to do?",
            MenuId::Wallets => "Wallets",
            MenuId::MasterKeys => "Master keys",
            MenuId::Networks => "Select the network",
            MenuId::Reckless => "Reckless",
        }
    }

    /// Where back leads.
    pub fn parent(&self) -> MenuId {
        match self {
            MenuId::Init | MenuId::NewKey => MenuId::Init,
            _ => MenuId::Main,
        }
    }
}

pub fn init_menu(has_persisted: bool) -> Vec<MenuItem> {
    let mut items = vec![
        MenuItem::new("Generate new key", MenuAction::GenerateKey),
        MenuItem::new("Enter recovery phrase", MenuAction::EnterPhrase),
    ];
    if has_persisted {
        items.push(MenuItem::new("Load key from memory", MenuAction::LoadKey));
    }
    items
}

pub fn new_key_menu() -> Vec<MenuItem> {
    vec![
        MenuItem::new("Continue", MenuAction::ConfirmKey),
        MenuItem::new("Regenerate", MenuAction::RegenerateKey),
        MenuItem::new("Back", MenuAction::Back),
    ]
}

pub fn main_menu(network: Network) -> Vec<MenuItem> {
    vec![
        MenuItem::new("Wallets", MenuAction::Wallets),
        MenuItem::new("Master keys", MenuAction::MasterKeys),
        MenuItem::new("Sign transaction", MenuAction::SignTransaction),
        MenuItem::new("Verify address", MenuAction::VerifyAddress),
        MenuItem::new("Use another password", MenuAction::ChangePassword),
        MenuItem::new(format!("Switch network ({})", network.label()), MenuAction::NetworkMenu),
        MenuItem::new("# Reckless", MenuAction::Reckless),
    ]
}

pub fn wallets_menu(session: &SessionState) -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = session
        .wallets
        .iter()
        .enumerate()
        .map(|(i, w)| MenuItem::new(w.name(), MenuAction::ShowWallet(i)))
        .collect();
    items.push(MenuItem::new("Back", MenuAction::Back));
    items
}

pub fn master_keys_menu(session: &SessionState) -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = session
        .paths
        .entries()
        .iter()
        .enumerate()
        .map(|(i, (label, path))| MenuItem::new(format!("{label} - {path}"), MenuAction::ShowMasterKey(i)))
        .collect();
    items.push(MenuItem::new("Back", MenuAction::Back));
    items
}

pub fn networks_menu() -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = Network::ALL
        .into_iter()
        .map(|n| MenuItem::new(n.label(), MenuAction::SelectNetwork(n)))
        .collect();
    items.push(MenuItem::new("Back", MenuAction::Back));
    items
}

pub fn reckless_menu() -> Vec<MenuItem> {
    vec![
        MenuItem::new("Show recovery phrase", MenuAction::ShowPhrase),
        MenuItem::new("Save key to memory", MenuAction::SaveKey),
        MenuItem::new("Delete key from memory", MenuAction::DeleteKey),
        MenuItem::new("Back", MenuAction::Back),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[MenuItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn load_offered_only_when_persisted() {
        assert_eq!(labels(&init_menu(false)), ["Generate new key", "Enter recovery phrase"]);
        assert_eq!(init_menu(true).last().map(|i| i.action), Some(MenuAction::LoadKey));
    }

    #[test]
    fn network_selector_lists_four_networks() {
        let items = networks_menu();
        assert_eq!(labels(&items), ["Mainnet", "Testnet", "Regtest", "Signet", "Back"]);
        assert_eq!(items[3].action, MenuAction::SelectNetwork(Network::Signet));
    }

    #[test]
    fn main_menu_names_active_network() {
        let items = main_menu(Network::Regtest);
        assert_eq!(items[5].label, "Switch network (Regtest)");
        assert_eq!(items.len(), 7);
    }

    #[test]
    fn master_keys_bind_index() {
        let items = master_keys_menu(&SessionState::new(Network::Mainnet));
        assert_eq!(items[0].label, "Single key - m/84h/0h/0h");
        assert_eq!(items[1].action, MenuAction::ShowMasterKey(1));
    }
}
