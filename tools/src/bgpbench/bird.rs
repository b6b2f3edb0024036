/*!
Reader for the text BIRD prints for `show route all`.

```text
Table master4:
192.0.2.0/24         unicast [peer1 2024-01-01] * (100) [AS13335i]
	via 198.51.100.1 on eth0
	Type: BGP univ
	BGP.origin: IGP
	BGP.as_path: 64512 13335
	BGP.next_hop: 198.51.100.1
	BGP.local_pref: 100
	BGP.community: (64512,100)
                     unicast [peer2 2024-01-01] (100) [AS13335i]
	...
```

An unindented line starts a new prefix, an indented line with a `[protocol]`
is another path to the same prefix, and `BGP.*` lines fill in the latest
path. Anything else is skipped.
*/

use super::route::{Prefix, Route};
use anyhow::{Context, anyhow};
use std::net::IpAddr;

pub fn parse(text: &str) -> anyhow::Result<Vec<Route>> {
    let mut routes = Vec::new();
    let mut prefix = None;
    for (n, line) in text.lines().enumerate() {
        parse_line(line, &mut prefix, &mut routes)
            .with_context(|| format!("Line {}: '{}'", n + 1, line.trim()))?;
    }
    Ok(routes)
}

fn parse_line(line: &str, prefix: &mut Option<Prefix>, routes: &mut Vec<Route>) -> anyhow::Result<()> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    if !line.starts_with(char::is_whitespace) {
        let first = trimmed.split_whitespace().next().unwrap_or_default();
        // Banners and table headings
        if !first.contains('/') {
            return Ok(());
        }
        let p = first.parse()?;
        *prefix = Some(p);
        routes.push(path(p, trimmed));
        return Ok(());
    }

    if let Some((name, value)) = trimmed
        .strip_prefix("BGP.")
        .and_then(|attr| attr.split_once(':'))
    {
        let route = routes
            .last_mut()
            .ok_or_else(|| anyhow!("Attribute before any route"))?;
        return attribute(route, name.trim(), value.trim());
    }

    if trimmed.contains('[') {
        let p = prefix.ok_or_else(|| anyhow!("Path before any prefix"))?;
        routes.push(path(p, trimmed));
    } else if let Some(hop) = via(trimmed) {
        if let Some(route) = routes.last_mut() {
            route.next_hop.get_or_insert(hop);
        }
    }
    Ok(())
}

fn via(text: &str) -> Option<IpAddr> {
    let mut tokens = text.split_whitespace();
    tokens.find(|t| *t == "via")?;
    tokens.next()?.parse().ok()
}

fn path(prefix: Prefix, text: &str) -> Route {
    let mut route = Route::new(prefix);
    route.next_hop = via(text);
    route
}

fn attribute(route: &mut Route, name: &str, value: &str) -> anyhow::Result<()> {
    match name {
        "origin" => route.origin = value.parse()?,
        // AS_SETs print as `{a b}` and are flattened into the path
        "as_path" => {
            route.as_path = value
                .split(|c: char| c.is_whitespace() || matches!(c, '{' | '}' | ','))
                .filter(|t| !t.is_empty())
                .map(str::parse::<u32>)
                .collect::<Result<_, _>>()?
        }
        "next_hop" => {
            if let Some(first) = value.split_whitespace().next() {
                route.next_hop = Some(first.parse()?);
            }
        }
        "med" => route.med = Some(value.parse()?),
        "local_pref" => route.local_pref = Some(value.parse()?),
        "community" => route.communities = communities(value)?,
        _ => {}
    }
    Ok(())
}

fn communities(value: &str) -> anyhow::Result<Vec<(u16, u16)>> {
    value
        .split_whitespace()
        .map(|c| -> anyhow::Result<(u16, u16)> {
            let (asn, v) = c
                .strip_prefix('(')
                .and_then(|c| c.strip_suffix(')'))
                .and_then(|c| c.split_once(','))
                .ok_or_else(|| anyhow!("Malformed community '{c}'"))?;
            Ok((asn.parse()?, v.parse()?))
        })
        .collect()
}
