//! Deterministic demo data for `--demo` and tests.
//!
//! Rows look like the service's Hong Kong equity snapshot: a latest price,
//! valuation ratios, growth metrics, an industry and a long-bull rating,
//! with a sprinkling of "N/A" values.

use serde_json::{Value, json};

use crate::models::{HistoryEntry, Row};

const COMPANIES: &[(&str, &str, &str)] = &[
    ("00700", "腾讯控股", "软件服务"),
    ("00005", "汇丰控股", "银行"),
    ("00941", "中国移动", "电信服务"),
    ("01299", "友邦保险", "保险"),
    ("00388", "香港交易所", "其他金融"),
    ("03690", "美团-W", "软件服务"),
    ("09988", "阿里巴巴-W", "零售"),
    ("01810", "小米集团-W", "电子设备"),
    ("02318", "中国平安", "保险"),
    ("00883", "中国海洋石油", "石油天然气"),
    ("01177", "中国生物制药", "医药生物"),
    ("02269", "药明生物", "医药生物"),
    ("00016", "新鸿基地产", "地产"),
    ("00001", "长和", "综合企业"),
    ("00939", "建设银行", "银行"),
    ("01211", "比亚迪股份", "汽车"),
    ("02020", "安踏体育", "纺织服饰"),
    ("00291", "华润啤酒", "食品饮料"),
    ("06690", "海尔智家", "家用电器"),
    ("00669", "创科实业", "机械设备"),
];

const BASE_DATE: (i32, u32, u32) = (2024, 1, 2);
const HISTORY_DAYS: i64 = 90;

/// Small deterministic generator (64-bit LCG).
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407))
    }

    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

fn seed_of(code: &str) -> u64 {
    code.bytes()
        .fold(1469598103934665603u64, |h, b| (h ^ b as u64).wrapping_mul(1099511628211))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn maybe(rng: &mut Lcg, v: f64) -> Value {
    if rng.chance(0.06) { json!("N/A") } else { json!(round2(v)) }
}

/// `count` demo rows; the first twenty are real tickers, the rest synthetic.
pub fn demo_rows(count: usize) -> Vec<Row> {
    (0..count)
        .map(|i| {
            let (code, name, industry) = match COMPANIES.get(i) {
                Some(&(c, n, ind)) => (c.to_string(), n.to_string(), ind),
                None => {
                    let (_, base, ind) = COMPANIES[i % COMPANIES.len()];
                    (format!("{:05}", 10000 + i), format!("{base}{}号", i / COMPANIES.len()), ind)
                }
            };
            demo_row(code, name, industry)
        })
        .collect()
}

fn demo_row(code: String, name: String, industry: &str) -> Row {
    let mut rng = Lcg::new(seed_of(&code));
    let price = rng.range(0.5, 400.0);
    let pe = rng.range(-5.0, 60.0);
    let growth = rng.range(-20.0, 60.0);
    let peg = if growth > 0.0 && pe > 0.0 { pe / growth } else { -1.0 };
    let eps = price / pe;
    let bull = if rng.chance(0.3) {
        format!("长牛{}年", 1 + (rng.next_f64() * 5.0) as u32)
    } else {
        String::new()
    };

    let mut row = Row::new(code, name)
        .with("所属行业", industry)
        .with("bull_label", bull)
        .with("昨收", round2(price))
        .with("昨涨跌幅", round2(rng.range(-8.0, 8.0)))
        .with("昨成交量", rng.range(1e4, 5e7).round())
        .with("昨换手率", round2(rng.range(0.0, 5.0)))
        .with("近一周涨跌幅", round2(rng.range(-15.0, 15.0)))
        .with("近一月涨跌幅", round2(rng.range(-30.0, 30.0)))
        .with("总市值(港元)", rng.range(1e9, 4e12).round())
        .with("基本每股收益同比增长率", round2(growth))
        .with("trend_analysis.r_squared", round2(rng.range(0.2, 0.99)));

    let pb = rng.range(0.3, 12.0);
    let cash_ratio = rng.range(-1.0, 3.0);
    let roe = rng.range(-10.0, 35.0);
    let dividend = rng.range(0.0, 9.0);
    let fair = eps * (8.5 + 2.0 * growth.max(0.0));
    let graham = (22.5 * eps.max(0.0) * pb * eps.max(0.0)).sqrt();

    let peg_value = maybe(&mut rng, peg);
    row = row
        .with("市盈率", maybe(&mut rng, pe))
        .with("PEG", peg_value.clone())
        .with("PEGY", peg_value)
        .with("市净率", maybe(&mut rng, pb))
        .with("合理股价", maybe(&mut rng, fair))
        .with("格雷厄姆数", maybe(&mut rng, graham))
        .with("净现比", maybe(&mut rng, cash_ratio))
        .with("股东权益回报率(%)", maybe(&mut rng, roe))
        .with("股息率TTM(%)", maybe(&mut rng, dividend));
    row.date = "2024-04-30".to_string();
    row.is_ggt = rng.chance(0.6);
    row.intro = Some(format!("{industry}行业上市公司。"));
    row
}

/// Daily history for one code: a random walk over the demo metrics with
/// occasional unparseable values.
pub fn demo_history(code: &str) -> Vec<HistoryEntry> {
    let (y, m, d) = BASE_DATE;
    let Some(start) = chrono::NaiveDate::from_ymd_opt(y, m, d) else {
        return Vec::new();
    };
    let mut rng = Lcg::new(seed_of(code) ^ 0x5eed);
    let mut price = rng.range(5.0, 300.0);
    let mut pe = rng.range(5.0, 40.0);
    let mut peg = rng.range(0.2, 2.5);

    (0..HISTORY_DAYS)
        .map(|offset| {
            price = (price * (1.0 + rng.range(-0.03, 0.03))).max(0.1);
            pe = (pe * (1.0 + rng.range(-0.02, 0.02))).max(0.5);
            peg = (peg * (1.0 + rng.range(-0.04, 0.04))).max(0.05);
            let date = start + chrono::Duration::days(offset);
            let mut entry = HistoryEntry {
                date: date.format("%Y-%m-%d").to_string(),
                ..HistoryEntry::default()
            };
            entry.fields.insert("昨收".into(), json!(round2(price)));
            entry.fields.insert("市盈率".into(), maybe(&mut rng, pe));
            entry.fields.insert("PEG".into(), maybe(&mut rng, peg));
            entry
                .fields
                .insert("昨涨跌幅".into(), json!(round2(rng.range(-5.0, 5.0))));
            entry
        })
        .collect()
}
