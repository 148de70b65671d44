//! Vulnerability signature tables.
//!
//! Every pattern is compiled case-insensitively once, on first use. Input
//! tables match decoded user input; response tables match raw bodies. The
//! injection input tables are matched against raw bodies too, to catch
//! payloads echoed back unescaped.

use std::net::{Ipv4Addr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;
use url::{Host, Url};

use crate::security::types::{SecurityType, Severity};

/// A named, compiled pattern.
#[derive(Debug)]
pub struct Signature {
    pub name: &'static str,
    pub pattern: Regex,
    pub severity: Severity,
}

impl Signature {
    /// First match of this signature in `text`.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern.find(text).map(|m| m.as_str())
    }
}

fn table(entries: &[(&'static str, &str, Severity)]) -> Vec<Signature> {
    entries
        .iter()
        .map(|&(name, pattern, severity)| Signature {
            name,
            pattern: Regex::new(&format!("(?i){pattern}"))
                .unwrap_or_else(|e| panic!("signature '{name}' does not compile: {e}")),
            severity,
        })
        .collect()
}

static SQL_INJECTION: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        ("stacked-statement", r"'\s*;\s*(drop|delete|insert|update|truncate|alter|exec)\b", Severity::Critical),
        ("union-select", r"\bunion(\s+all)?\s+select\b", Severity::High),
        ("numeric-tautology", r"\bor\s+'?1'?\s*=\s*'?1\b", Severity::High),
        ("string-tautology", r"'\s*or\s+'[^']*'\s*=\s*'", Severity::High),
        ("time-based", r"\b(sleep\s*\(\s*\d+\s*\)|benchmark\s*\(|waitfor\s+delay\b|pg_sleep\s*\()", Severity::High),
        ("comment-terminator", r"'\s*(--|#|/\*)", Severity::Medium),
    ])
});

static XSS: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        ("script-tag", r"<\s*script\b", Severity::High),
        ("javascript-uri", r"javascript\s*:", Severity::High),
        (
            "event-handler",
            r"\bon(error|load|click|mouseover|mouseenter|focus|blur|submit|change|keydown|keyup|toggle|animationstart)\s*=",
            Severity::Medium,
        ),
        ("embedding-tag", r"<\s*(iframe|object|embed|applet|base|meta|svg)\b", Severity::Medium),
        ("data-uri", r"data\s*:\s*text/html", Severity::Medium),
        ("script-sink", r"(document\.cookie|\beval\s*\(|expression\s*\()", Severity::Medium),
    ])
});

static COMMAND_INJECTION: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        (
            "shell-chain",
            r"(;|\|\||&&|\|)\s*(cat|ls|rm|wget|curl|nc|bash|sh|whoami|id|uname|chmod|ping|powershell)\b",
            Severity::Critical,
        ),
        ("command-substitution", r"(\$\([^)]*\)|`[^`]+`)", Severity::High),
        ("newline-command", r"[\r\n]\s*(cat|ls|rm|wget|curl|whoami|id)\b", Severity::High),
    ])
});

static PATH_TRAVERSAL: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        ("dot-dot-slash", r"\.\.[/\\]", Severity::High),
        ("system-path", r"(^|[\s=:])(/etc/(passwd|shadow|hosts)|/proc/self/|[a-z]:\\windows\\)", Severity::High),
    ])
});

static LDAP_INJECTION: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        ("filter-break", r"\)\s*\(\s*[|&!]", Severity::High),
        ("wildcard-filter", r"\*\s*\)\s*\(", Severity::Medium),
        ("attribute-wildcard", r"\(\s*[a-z]+\s*=\s*\*\s*\)", Severity::Medium),
    ])
});

static XXE: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        ("external-entity", r"<!\s*(doctype|entity)\b[^>]*\b(system|public)\b", Severity::Critical),
        ("entity-declaration", r"<!\s*entity\b", Severity::High),
    ])
});

static SSRF: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        ("cloud-metadata-host", r"169\.254\.169\.254|metadata\.google\.internal|100\.100\.100\.200", Severity::Critical),
        ("dangerous-scheme", r"\b(file|gopher|dict|ldap|jar)://", Severity::High),
    ])
});

static URL_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b[a-z][a-z0-9+.\-]*://[^\s'"<>]+"#)
        .unwrap_or_else(|e| panic!("url candidate pattern does not compile: {e}"))
});

/// Signatures matched against decoded input for `security_type`.
/// Types without input signatures return an empty slice.
pub fn input_signatures(security_type: SecurityType) -> &'static [Signature] {
    match security_type {
        SecurityType::SqlInjection => SQL_INJECTION.as_slice(),
        SecurityType::Xss => XSS.as_slice(),
        SecurityType::CommandInjection => COMMAND_INJECTION.as_slice(),
        SecurityType::PathTraversal => PATH_TRAVERSAL.as_slice(),
        SecurityType::LdapInjection => LDAP_INJECTION.as_slice(),
        SecurityType::Xxe => XXE.as_slice(),
        SecurityType::Ssrf => SSRF.as_slice(),
        SecurityType::Csrf
        | SecurityType::SensitiveDataExposure
        | SecurityType::BrokenAccessControl
        | SecurityType::BrokenAuthentication => &[],
    }
}

/// First URL in `input` whose host is internal (loopback, private, link-local,
/// unspecified or an internal-only name).
pub fn internal_url(input: &str) -> Option<&str> {
    URL_CANDIDATE
        .find_iter(input)
        .map(|m| m.as_str())
        .find(|candidate| Url::parse(candidate).ok().is_some_and(|url| is_internal_host(&url)))
}

fn is_internal_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(ip)) => is_internal_v4(ip),
        Some(Host::Ipv6(ip)) => is_internal_v6(ip),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost"
                || domain.ends_with(".localhost")
                || domain.ends_with(".internal")
                || domain.ends_with(".local")
        }
        None => false,
    }
}

fn is_internal_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_internal_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_internal_v4(v4);
    }
    let first = ip.segments()[0];
    // fc00::/7 unique local, fe80::/10 link local
    ip.is_loopback() || ip.is_unspecified() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
}

// Response tables: evidence that an attack reached a backend and leaked
// something back. Echoed payloads are matched separately, with the input
// tables (see `reflected_payload_signatures`).

static SQL_ERROR_DISCLOSURE: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        (
            "sql-error-message",
            r"(you have an error in your sql syntax|unclosed quotation mark|quoted string not properly terminated|\bORA-\d{5}\b|PG::SyntaxError|SQLSTATE\[|sqlite3?\.OperationalError|\bmysql_fetch_)",
            Severity::High,
        ),
    ])
});

static COMMAND_OUTPUT: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        ("passwd-contents", r"root:[x*]:0:0:", Severity::Critical),
        ("id-output", r"uid=\d+\([a-z_][a-z0-9_-]*\)\s+gid=\d+", Severity::Critical),
    ])
});

static FILE_DISCLOSURE: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        ("passwd-contents", r"root:[x*]:0:0:", Severity::Critical),
        ("windows-ini-contents", r"\[(boot loader|extensions|fonts)\]", Severity::High),
    ])
});

static LDAP_ERROR: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[(
        "ldap-error-message",
        r"(javax\.naming\.|LDAPException|ldap_search\(|invalid dn syntax|bad search filter)",
        Severity::Medium,
    )])
});

static SSRF_RESPONSE: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[(
        "cloud-metadata-contents",
        r"(\bami-id\b|\binstance-id\b|iam/security-credentials|computeMetadata/v1)",
        Severity::Critical,
    )])
});

static SENSITIVE_DATA: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        ("private-key", r"-----BEGIN ([A-Z]+ )?PRIVATE KEY-----", Severity::Critical),
        ("aws-access-key", r"\bAKIA[0-9A-Z]{16}\b", Severity::Critical),
        (
            "credential-assignment",
            r#"["']?\b(password|passwd|pwd|secret|api[_-]?key|access[_-]?token|client[_-]?secret)["']?\s*[:=]\s*["']?[^\s"',&<]{3,}"#,
            Severity::High,
        ),
        ("bearer-token", r"\beyJ[\w-]{5,}\.eyJ[\w-]{5,}\.[\w-]+", Severity::High),
        ("java-stack-trace", r"\bat\s+[\w$.]+\([\w$]+\.java:\d+\)", Severity::Medium),
        ("python-traceback", r"Traceback \(most recent call last\)", Severity::Medium),
        ("dotnet-exception", r"\bSystem\.[A-Za-z.]*Exception\b", Severity::Medium),
        (
            "internal-ip",
            r"\b(10\.\d{1,3}\.\d{1,3}\.\d{1,3}|192\.168\.\d{1,3}\.\d{1,3}|172\.(1[6-9]|2\d|3[01])\.\d{1,3}\.\d{1,3})\b",
            Severity::Low,
        ),
    ])
});

static ACCESS_CONTROL_RESPONSE: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        ("directory-listing", r"<title>\s*Index of /", Severity::Medium),
        ("admin-interface", r#"<(a|form)[^>]+(href|action)\s*=\s*["']?/(admin|manage|console)\b"#, Severity::Low),
    ])
});

static AUTHENTICATION_RESPONSE: Lazy<Vec<Signature>> = Lazy::new(|| {
    table(&[
        ("session-id-in-url", r"[?&;](jsessionid|phpsessid|sessionid|sid)=[\w-]+", Severity::Medium),
        ("password-in-url", r"[?&](password|passwd|pwd)=[^&\s]+", Severity::High),
    ])
});

/// Disclosure signatures matched against raw response bodies for `security_type`.
pub fn response_signatures(security_type: SecurityType) -> &'static [Signature] {
    match security_type {
        SecurityType::SqlInjection => SQL_ERROR_DISCLOSURE.as_slice(),
        SecurityType::CommandInjection => COMMAND_OUTPUT.as_slice(),
        SecurityType::PathTraversal => FILE_DISCLOSURE.as_slice(),
        SecurityType::LdapInjection => LDAP_ERROR.as_slice(),
        SecurityType::Ssrf => SSRF_RESPONSE.as_slice(),
        SecurityType::SensitiveDataExposure => SENSITIVE_DATA.as_slice(),
        SecurityType::BrokenAccessControl => ACCESS_CONTROL_RESPONSE.as_slice(),
        SecurityType::BrokenAuthentication => AUTHENTICATION_RESPONSE.as_slice(),
        SecurityType::Xss | SecurityType::Xxe | SecurityType::Csrf => &[],
    }
}

/// Input signatures that also flag an attack payload echoed unescaped in a
/// response body. Only injection types: a `../` or URL in a page is ordinary
/// markup, not a reflected payload.
pub fn reflected_payload_signatures(security_type: SecurityType) -> &'static [Signature] {
    if security_type.is_injection() {
        input_signatures(security_type)
    } else {
        &[]
    }
}

static POST_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<form\b[^>]*\bmethod\s*=\s*["']?post\b[^>]*>.*?</form>"#)
        .unwrap_or_else(|e| panic!("form pattern does not compile: {e}"))
});

static CSRF_TOKEN_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bname\s*=\s*["']?(csrf|_csrf|csrf_token|csrfmiddlewaretoken|authenticity_token|__requestverificationtoken|xsrf|_xsrf|_token)\b"#,
    )
    .unwrap_or_else(|e| panic!("csrf token pattern does not compile: {e}"))
});

/// Opening tag of the first POST form that carries no anti-CSRF token field.
pub fn form_without_csrf_token(body: &str) -> Option<&str> {
    POST_FORM
        .find_iter(body)
        .map(|m| m.as_str())
        .find(|form| !CSRF_TOKEN_FIELD.is_match(form))
        .map(|form| form.split_inclusive('>').next().unwrap_or(form))
}
