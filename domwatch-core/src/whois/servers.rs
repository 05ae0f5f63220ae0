use std::collections::HashMap;

use once_cell::sync::Lazy;

const SERVER_TABLE: &[(&str, &str)] = &[
    // Generic TLDs
    ("com", "whois.verisign-grs.com"),
    ("net", "whois.verisign-grs.com"),
    ("org", "whois.pir.org"),
    ("info", "whois.afilias.net"),
    ("biz", "whois.biz"),
    ("name", "whois.nic.name"),
    ("mobi", "whois.afilias.net"),
    ("pro", "whois.registrypro.pro"),
    ("edu", "whois.educause.edu"),
    ("gov", "whois.dotgov.gov"),
    ("int", "whois.iana.org"),
    // Google registry
    ("app", "whois.nic.google"),
    ("dev", "whois.nic.google"),
    ("page", "whois.nic.google"),
    // New gTLDs
    ("blog", "whois.nic.blog"),
    ("cloud", "whois.nic.cloud"),
    ("xyz", "whois.nic.xyz"),
    ("online", "whois.nic.online"),
    ("site", "whois.nic.site"),
    ("tech", "whois.nic.tech"),
    ("store", "whois.nic.store"),
    ("shop", "whois.nic.shop"),
    ("digital", "whois.nic.digital"),
    ("solutions", "whois.nic.solutions"),
    ("systems", "whois.nic.systems"),
    ("software", "whois.nic.software"),
    ("technology", "whois.nic.technology"),
    ("studio", "whois.nic.studio"),
    ("design", "whois.nic.design"),
    ("agency", "whois.nic.agency"),
    ("email", "whois.nic.email"),
    ("live", "whois.nic.live"),
    ("world", "whois.nic.world"),
    // Country codes
    ("io", "whois.nic.io"),
    ("co", "whois.nic.co"),
    ("me", "whois.nic.me"),
    ("ai", "whois.nic.ai"),
    ("gg", "whois.gg"),
    ("tv", "tvwhois.verisign-grs.com"),
    ("cc", "ccwhois.verisign-grs.com"),
    ("br", "whois.registro.br"),
    ("pt", "whois.dns.pt"),
    ("ar", "whois.nic.ar"),
    ("mx", "whois.mx"),
    ("cl", "whois.nic.cl"),
    ("us", "whois.nic.us"),
    ("ca", "whois.cira.ca"),
    ("uk", "whois.nic.uk"),
    ("de", "whois.denic.de"),
    ("fr", "whois.nic.fr"),
    ("es", "whois.nic.es"),
    ("it", "whois.nic.it"),
    ("nl", "whois.domain-registry.nl"),
    ("eu", "whois.eu"),
    ("ch", "whois.nic.ch"),
    ("se", "whois.iis.se"),
    ("pl", "whois.dns.pl"),
    ("jp", "whois.jprs.jp"),
    ("au", "whois.auda.org.au"),
    ("nz", "whois.srs.net.nz"),
    ("in", "whois.registry.in"),
];

pub static WHOIS_SERVERS: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| SERVER_TABLE.iter().copied().collect());

pub fn get_whois_server(tld: &str) -> Option<&'static str> {
    WHOIS_SERVERS.get(tld.to_lowercase().as_str()).copied()
}

pub fn get_tld(domain: &str) -> Option<&str> {
    domain.rsplit('.').next().filter(|tld| !tld.is_empty())
}
