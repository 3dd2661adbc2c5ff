use serde::Serialize;

use hellomask_core::hello::inspect::ClientHelloInfo;
use hellomask_core::hello::ja3::Ja3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid output format '{}'. Expected 'text' or 'json'.", s),
        }
    }
}

/// Everything `hellomask build` reports about one assembled hello.
pub struct BuildReport<'a> {
    pub sni: &'a str,
    pub fake_sni: Option<&'a str>,
    pub extensions: Vec<u16>,
    pub padding_len: Option<usize>,
    pub outer_ja3: Ja3,
    pub decoy_ja3: Option<Ja3>,
    pub records: &'a [u8],
}

#[derive(Serialize)]
struct JsonBuild<'a> {
    sni: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fake_sni: Option<&'a str>,
    extensions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    padding_len: Option<usize>,
    ja3_hash: &'a str,
    ja3_raw: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    decoy_ja3_hash: Option<&'a str>,
    record_len: usize,
    record_hex: String,
}

fn hex_codes(values: &[u16]) -> Vec<String> {
    values.iter().map(|v| format!("0x{:04x}", v)).collect()
}

pub fn print_build(report: &BuildReport<'_>, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("  SNI:        {}", report.sni);
            println!("  Fake SNI:   {}", report.fake_sni.unwrap_or("(padding disabled)"));
            println!("  Extensions: {}", hex_codes(&report.extensions).join(", "));
            if let Some(len) = report.padding_len {
                println!("  Padding:    {} bytes", len);
            }
            println!("  Record:     {} bytes", report.records.len());
            println!("  ──────────────────────────────────────────────────");
            println!("  JA3:        {}", report.outer_ja3.hash);
            println!("  JA3 raw:    {}", report.outer_ja3.raw_string);
            if let Some(decoy) = &report.decoy_ja3 {
                println!("  Decoy JA3:  {}", decoy.hash);
            }
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("{}", hex::encode(report.records));
        }
        OutputFormat::Json => {
            let record = JsonBuild {
                sni: report.sni,
                fake_sni: report.fake_sni,
                extensions: hex_codes(&report.extensions),
                padding_len: report.padding_len,
                ja3_hash: &report.outer_ja3.hash,
                ja3_raw: &report.outer_ja3.raw_string,
                decoy_ja3_hash: report.decoy_ja3.as_ref().map(|j| j.hash.as_str()),
                record_len: report.records.len(),
                record_hex: hex::encode(report.records),
            };
            println!("{}", serde_json::to_string(&record)?);
        }
    }
    Ok(())
}

pub fn print_info(info: &ClientHelloInfo, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            print_info_text(info, "  ");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(info)?),
    }
    Ok(())
}

fn print_info_text(info: &ClientHelloInfo, indent: &str) {
    println!(
        "{}SNI:        {}",
        indent,
        info.server_name.as_deref().unwrap_or("(none)")
    );
    println!("{}TLS ver:    0x{:04x}", indent, info.tls_version);
    println!("{}Ciphers:    {} suites", indent, info.cipher_suites.len());
    println!("{}Extensions: {}", indent, hex_codes(&info.extensions).join(", "));
    if !info.alpn_protocols.is_empty() {
        println!("{}ALPN:       {}", indent, info.alpn_protocols.join(", "));
    }
    if let Some(len) = info.padding_len {
        println!("{}Padding:    {} bytes", indent, len);
    }
    if let Some(inner) = &info.smuggled {
        println!("{}── hello inside padding ──", indent);
        print_info_text(inner, &format!("{}  ", indent));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::parse("text").unwrap(), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("json").unwrap(), OutputFormat::Json);
        assert!(OutputFormat::parse("xml").is_err());
    }

    #[test]
    fn test_hex_codes() {
        assert_eq!(hex_codes(&[0x0015, 0x0000]), vec!["0x0015", "0x0000"]);
    }
}
