use valuation_core::Sector;

/// Exchange suffixes stripped before table lookup
const EXCHANGE_SUFFIXES: &[&str] = &[".NS", ".BO", ".NSE", ".BSE"];

const BANKING: &[&str] = &[
    "HDFCBANK", "ICICIBANK", "SBIN", "KOTAKBANK", "AXISBANK", "INDUSINDBK",
    "BANKBARODA", "PNB", "CANBK", "FEDERALBNK", "IDFCFIRSTB", "AUBANK",
    "BANDHANBNK", "RBLBANK", "YESBANK", "UNIONBANK", "INDIANB", "MAHABANK",
];

const PHARMA: &[&str] = &[
    "SUNPHARMA", "DRREDDY", "CIPLA", "DIVISLAB", "AUROPHARMA", "LUPIN",
    "TORNTPHARM", "ALKEM", "ZYDUSLIFE", "GLENMARK", "BIOCON", "LAURUSLABS",
    "IPCALAB", "NATCOPHARM", "AJANTPHARM", "ABBOTINDIA", "GLAND", "MANKIND",
];

const REAL_ESTATE: &[&str] = &[
    "DLF", "GODREJPROP", "OBEROIRLTY", "PRESTIGE", "PHOENIXLTD", "BRIGADE",
    "SOBHA", "LODHA", "MAHLIFE", "SUNTECK", "KOLTEPATIL", "SIGNATURE",
];

const IT: &[&str] = &[
    "TCS", "INFY", "WIPRO", "HCLTECH", "TECHM", "LTIM", "MPHASIS",
    "PERSISTENT", "COFORGE", "LTTS", "TATAELXSI", "CYIENT", "ZENSARTECH",
];

const FMCG: &[&str] = &[
    "HINDUNILVR", "ITC", "NESTLEIND", "BRITANNIA", "DABUR", "MARICO",
    "GODREJCP", "COLPAL", "TATACONSUM", "EMAMILTD", "VBL", "RADICO",
];

const ENERGY: &[&str] = &[
    "RELIANCE", "ONGC", "NTPC", "POWERGRID", "COALINDIA", "IOC", "BPCL",
    "HINDPETRO", "GAIL", "TATAPOWER", "ADANIGREEN", "ADANIPOWER", "OIL",
];

/// Strip a known exchange suffix and uppercase the remainder
fn normalize(ticker: &str) -> String {
    let upper = ticker.trim().to_uppercase();
    for suffix in EXCHANGE_SUFFIXES {
        if let Some(base) = upper.strip_suffix(suffix) {
            return base.to_string();
        }
    }
    upper
}

/// Map a ticker to its sector tag. Unknown symbols default to IT, the
/// catch-all sector routed to the generic DCF model; this operation cannot
/// fail.
pub fn classify(ticker: &str) -> Sector {
    let base = normalize(ticker);
    let tables: [(&[&str], Sector); 6] = [
        (BANKING, Sector::Banking),
        (PHARMA, Sector::Pharma),
        (REAL_ESTATE, Sector::RealEstate),
        (IT, Sector::It),
        (FMCG, Sector::Fmcg),
        (ENERGY, Sector::Energy),
    ];
    for (table, sector) in tables {
        if table.contains(&base.as_str()) {
            return sector;
        }
    }
    Sector::It
}
