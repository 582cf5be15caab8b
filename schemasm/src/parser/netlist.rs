//! Allegro Netlist Parser
//!
//! Parses the `$NETS` section of an Allegro-style netlist export into a
//! pin → signal lookup. Each net line has the form
//!
//! ```text
//! 'VCC_12V' ; H7.1 R7.1 R9.1
//! ```
//!
//! Long pin lists are continued on the next line after a trailing ` ,`.
//! Parsing is permissive: lines that do not look like a net are skipped.

use std::collections::HashMap;

use serde::Serialize;

const NETS_SECTION: &str = "$NETS";

/// Pin reference key (`R1.1`) → signal name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PinSignalMap {
    pins: HashMap<String, String>,
}

impl PinSignalMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the lookup key for a designator and pin number
    pub fn key(designator: &str, pin_number: impl std::fmt::Display) -> String {
        format!("{}.{}", designator, pin_number)
    }

    pub fn get(&self, pin_ref: &str) -> Option<&str> {
        self.pins.get(pin_ref).map(String::as_str)
    }

    pub fn signal_for(&self, designator: &str, pin_number: impl std::fmt::Display) -> Option<&str> {
        self.get(&Self::key(designator, pin_number))
    }

    pub fn insert(&mut self, pin_ref: impl Into<String>, signal: impl Into<String>) {
        self.pins.insert(pin_ref.into(), signal.into());
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pins.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries sorted by pin reference, for stable output
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort();
        entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PinSignalMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// One parsed net line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetEntry {
    pub signal: String,
    pub pins: Vec<String>,
}

pub struct NetlistParser;

impl NetlistParser {
    /// Parse netlist text into a pin → signal lookup
    pub fn parse(text: &str) -> PinSignalMap {
        let nets = Self::parse_nets(text);

        let mut map = PinSignalMap::new();
        for net in nets {
            for pin in net.pins {
                map.insert(pin, net.signal.clone());
            }
        }

        tracing::debug!("Parsed netlist: {} pins", map.len());
        map
    }

    /// Parse the net lines, in first-appearance order of each signal.
    ///
    /// A signal declared twice keeps its position; the later pin list wins.
    pub fn parse_nets(text: &str) -> Vec<NetEntry> {
        let normalized = Self::normalize(text);

        let mut nets: Vec<NetEntry> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut in_nets = false;

        for line in normalized.lines() {
            let trimmed = line.trim();

            if trimmed == NETS_SECTION {
                in_nets = true;
                continue;
            }
            if trimmed.starts_with('$') {
                in_nets = false;
                continue;
            }
            if !in_nets || trimmed.is_empty() || trimmed.starts_with(';') {
                continue;
            }

            let Some(entry) = Self::parse_net_line(trimmed) else {
                continue;
            };

            match index.get(&entry.signal) {
                Some(&i) => nets[i] = entry,
                None => {
                    index.insert(entry.signal.clone(), nets.len());
                    nets.push(entry);
                }
            }
        }

        nets
    }

    /// `'<signal>' ; <pin refs>`; quotes are optional
    fn parse_net_line(line: &str) -> Option<NetEntry> {
        let (left, right) = line.split_once(';')?;

        let left = left.trim_end();
        let left = left
            .strip_prefix(|c: char| c == '\'' || c == '"')
            .unwrap_or(left);
        let left = left
            .strip_suffix(|c: char| c == '\'' || c == '"')
            .unwrap_or(left);

        let pins = right.split_whitespace().map(str::to_string).collect();

        Some(NetEntry {
            signal: left.trim().to_string(),
            pins,
        })
    }

    fn normalize(text: &str) -> String {
        text.replace('\r', "")
            .replace("\n\n", "\n")
            .replace(" ,\n", " ")
    }
}

/// Convenience wrapper around [`NetlistParser::parse`]
pub fn parse_netlist(text: &str) -> PinSignalMap {
    NetlistParser::parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        let map = parse_netlist("$NETS\n'VCC' ; R1.1 C2.2\n$END\n");

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("R1.1"), Some("VCC"));
        assert_eq!(map.get("C2.2"), Some("VCC"));
    }

    #[test]
    fn test_unquoted_and_double_quoted() {
        let map = parse_netlist("$NETS\nGND ; R1.2\n\"SDA\" ; U1.5 R3.1\n$END");

        assert_eq!(map.signal_for("R1", 2), Some("GND"));
        assert_eq!(map.signal_for("U1", 5), Some("SDA"));
        assert_eq!(map.signal_for("R3", 1), Some("SDA"));
    }

    #[test]
    fn test_skips_comments_blank_and_malformed() {
        let text = "$NETS\n; comment line\n\n'VCC' ; R1.1\nno separator here\n$END\n";
        let map = parse_netlist(text);

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("R1.1"), Some("VCC"));
    }

    #[test]
    fn test_lines_outside_section_ignored() {
        let text = "$PACKAGES\n'R0805' ; R1\n$NETS\n'VCC' ; R1.1\n$END\n'LATE' ; R2.1\n";
        let map = parse_netlist(text);

        assert_eq!(map.len(), 1);
        assert!(map.get("R1").is_none());
        assert!(map.get("R2.1").is_none());
    }

    #[test]
    fn test_reentering_nets_resumes() {
        let text = "$NETS\n'A' ; R1.1\n$OTHER\n'X' ; R9.9\n$NETS\n'B' ; R2.1\n$END";
        let map = parse_netlist(text);

        assert_eq!(map.get("R1.1"), Some("A"));
        assert_eq!(map.get("R2.1"), Some("B"));
        assert!(map.get("R9.9").is_none());
    }

    #[test]
    fn test_continuation_lines() {
        let text = "$NETS\r\n'VCC' ; R1.1 R2.1 ,\r\nR3.1 R4.1\r\n$END\r\n";
        let map = parse_netlist(text);

        assert_eq!(map.len(), 4);
        assert_eq!(map.get("R4.1"), Some("VCC"));
    }

    #[test]
    fn test_duplicate_signal_replaces_pins() {
        let text = "$NETS\n'VCC' ; R1.1\n'GND' ; R2.2\n'VCC' ; R3.1\n$END";
        let nets = NetlistParser::parse_nets(text);

        assert_eq!(nets.len(), 2);
        assert_eq!(nets[0].signal, "VCC");
        assert_eq!(nets[0].pins, vec!["R3.1".to_string()]);

        let map = NetlistParser::parse(text);
        assert!(map.get("R1.1").is_none());
        assert_eq!(map.get("R3.1"), Some("VCC"));
    }

    #[test]
    fn test_sorted_is_stable() {
        let map = parse_netlist("$NETS\n'N' ; U2.1 C1.1 R5.3\n$END");
        let keys: Vec<_> = map.sorted().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["C1.1", "R5.3", "U2.1"]);
    }
}
