//! CRIF fixtures shared by the integration tests.

#![allow(dead_code)]

use pricer_simm::{Crif, CrifRecord, ProductClass, RiskType};

/// `(trade id, qualifier, bucket, label1, label2, amount)`.
pub type Row = (&'static str, &'static str, &'static str, &'static str, &'static str, f64);

/// Builds a netting set `pf` CRIF with USD amounts.
pub fn crif(pc: ProductClass, rt: RiskType, rows: &[Row]) -> Crif {
    rows.iter()
        .map(|&(trade, qualifier, bucket, label1, label2, amount)| {
            CrifRecord::new(trade, "pf", pc, rt)
                .with_qualifier(qualifier)
                .with_bucket(bucket)
                .with_labels(label1, label2)
                .with_amount("USD", amount)
                .with_amount_usd(amount)
        })
        .collect()
}

pub const IR_DELTA: &[Row] = &[
    ("trade_01", "BRL", "3", "1y", "Libor1m", 1023.45),
    ("trade_02", "BRL", "3", "2y", "Libor1m", 1024.45),
    ("trade_03", "BRL", "3", "5y", "Libor1m", -1025.45),
    ("trade_04", "BRL", "3", "10y", "Libor1m", 1026.45),
    ("trade_05", "BRL", "3", "1y", "Libor3m", -1027.45),
    ("trade_06", "BRL", "3", "2y", "Libor3m", 1028.45),
    ("trade_07", "BRL", "3", "5y", "Libor3m", 1029.45),
    ("trade_08", "BRL", "3", "10y", "Libor3m", 1030.45),
    ("trade_09", "BRL", "3", "1y", "Libor6m", -1031.45),
    ("trade_10", "BRL", "3", "2y", "Libor6m", -1032.45),
    ("trade_11", "BRL", "3", "5y", "Libor6m", 1033.45),
    ("trade_12", "BRL", "3", "10y", "Libor6m", 1034.45),
    ("trade_13", "BRL", "3", "1y", "Libor12m", -1035.45),
    ("trade_14", "BRL", "3", "2y", "Libor12m", 1036.45),
    ("trade_15", "BRL", "3", "5y", "Libor12m", -1037.45),
    ("trade_16", "BRL", "3", "10y", "Libor12m", 1038.45),
    ("trade_17", "JPY", "2", "1y", "Libor1m", 1039.45),
    ("trade_18", "JPY", "2", "2y", "Libor1m", -1040.45),
    ("trade_19", "JPY", "2", "5y", "Libor1m", -1041.45),
    ("trade_20", "JPY", "2", "10y", "Libor1m", -1042.45),
    ("trade_21", "JPY", "2", "1y", "Libor3m", 1043.45),
    ("trade_22", "JPY", "2", "2y", "Libor3m", -1044.45),
    ("trade_23", "JPY", "2", "5y", "Libor3m", 1045.45),
    ("trade_24", "JPY", "2", "10y", "Libor3m", -1046.45),
    ("trade_25", "JPY", "2", "1y", "Libor6m", 1047.45),
    ("trade_26", "JPY", "2", "2y", "Libor6m", 1048.45),
    ("trade_27", "JPY", "2", "5y", "Libor6m", -1049.45),
    ("trade_28", "JPY", "2", "10y", "Libor6m", -1050.45),
    ("trade_29", "JPY", "2", "1y", "Libor12m", 1051.45),
    ("trade_30", "JPY", "2", "2y", "Libor12m", -1052.45),
    ("trade_31", "JPY", "2", "5y", "Libor12m", 1053.45),
    ("trade_32", "JPY", "2", "10y", "Libor12m", 1053.45),
    ("trade_33", "USD", "1", "1y", "Libor1m", -1053.45),
    ("trade_34", "USD", "1", "2y", "Libor1m", -1053.45),
    ("trade_35", "USD", "1", "5y", "Libor1m", 1053.45),
    ("trade_36", "USD", "1", "10y", "Libor1m", -1053.45),
    ("trade_37", "USD", "1", "1y", "Libor3m", 1053.45),
    ("trade_38", "USD", "1", "2y", "Libor3m", 1053.45),
    ("trade_39", "USD", "1", "5y", "Libor3m", -1053.45),
    ("trade_40", "USD", "1", "10y", "Libor3m", -1053.45),
    ("trade_41", "USD", "1", "1y", "Libor6m", 1053.45),
    ("trade_42", "USD", "1", "2y", "Libor6m", 1053.45),
    ("trade_43", "USD", "1", "5y", "Libor6m", 1053.45),
    ("trade_44", "USD", "1", "10y", "Libor6m", -1053.45),
    ("trade_45", "USD", "1", "1y", "Libor12m", 1053.45),
    ("trade_46", "USD", "1", "2y", "Libor12m", 1053.45),
    ("trade_47", "USD", "1", "5y", "Libor12m", 1053.45),
    ("trade_48", "USD", "1", "10y", "Libor12m", 1053.45),
];

pub const FX_DELTA: &[Row] = &[
    ("trade_01", "IDR", "", "", "", 5402.350999),
    ("trade_02", "JPY", "", "", "", -34390.56314),
    ("trade_03", "USD", "", "", "", 2254.604708),
];

pub const CRQ_DELTA: &[Row] = &[
    ("trade_01", "Issuer 1", "1", "10y", "", 0.0),
    ("trade_02", "Issuer 1", "1", "1y", "", 8.059730786),
    ("trade_03", "Issuer 1", "1", "2y", "", 0.0),
    ("trade_04", "Issuer 1", "1", "3y", "", 0.0),
    ("trade_05", "Issuer 1", "1", "5y", "", 0.0),
    ("trade_06", "Issuer 2", "2", "10y", "", 0.0),
    ("trade_07", "Issuer 2", "2", "1y", "", 3.635153393),
    ("trade_08", "Issuer 2", "2", "2y", "", 4.07343881),
    ("trade_09", "Issuer 2", "2", "3y", "", 0.0),
    ("trade_10", "Issuer 2", "2", "5y", "", 0.0),
    ("trade_11", "Issuer 3", "3", "10y", "", 0.0),
    ("trade_12", "Issuer 3", "3", "1y", "", 580.6019555),
    ("trade_13", "Issuer 3", "3", "2y", "", 5078.479979),
    ("trade_14", "Issuer 3", "3", "3y", "", 0.0),
    ("trade_15", "Issuer 3", "3", "5y", "", 0.0),
    ("trade_16", "Issuer 4", "4", "10y", "", 0.0),
    ("trade_17", "Issuer 4", "4", "1y", "", -70.1134237),
    ("trade_18", "Issuer 4", "4", "2y", "", -36.92112038),
    ("trade_19", "Issuer 4", "4", "3y", "", -2237.406338),
    ("trade_20", "Issuer 4", "4", "5y", "", 0.0),
    ("trade_21", "Issuer 5", "5", "10y", "", 0.0),
    ("trade_22", "Issuer 5", "5", "1y", "", 4.289346749),
    ("trade_23", "Issuer 5", "5", "2y", "", 14.13859239),
    ("trade_24", "Issuer 5", "5", "3y", "", 1345.479615),
    ("trade_25", "Issuer 5", "5", "5y", "", 0.0),
    ("trade_26", "Issuer 6", "6", "10y", "", 0.0),
    ("trade_27", "Issuer 6", "6", "1y", "", 8.508687406),
    ("trade_28", "Issuer 6", "6", "2y", "", 20.53329364),
    ("trade_29", "Issuer 6", "6", "3y", "", 404.4754133),
    ("trade_30", "Issuer 6", "6", "5y", "", 403.8745725),
    ("trade_31", "Issuer 7", "7", "10y", "", 60.55963973),
    ("trade_32", "Issuer 7", "7", "1y", "", -1.811958229),
    ("trade_33", "Issuer 7", "7", "2y", "", -5.504450405),
    ("trade_34", "Issuer 7", "7", "3y", "", -4.260395846),
    ("trade_35", "Issuer 7", "7", "5y", "", 474.0116061),
    ("trade_36", "Issuer 8", "8", "10y", "", 104.8098969),
    ("trade_37", "Issuer 8", "8", "1y", "", -0.097966563),
    ("trade_38", "Issuer 8", "8", "2y", "", -0.431121774),
    ("trade_39", "Issuer 8", "8", "3y", "", -0.686076784),
    ("trade_40", "Issuer 8", "8", "5y", "", 260.6834549),
    ("trade_41", "Issuer 9", "9", "10y", "", 134.4598543),
    ("trade_42", "Issuer 9", "9", "1y", "", 0.008044421),
    ("trade_43", "Issuer 9", "9", "2y", "", 0.013779813),
    ("trade_44", "Issuer 9", "9", "3y", "", 0.147860763),
    ("trade_45", "Issuer 9", "9", "5y", "", 683.9072321),
    ("trade_46", "Issuer 10", "10", "10y", "", 122.1352924),
    ("trade_47", "Issuer 10", "10", "1y", "", 0.069530089),
    ("trade_48", "Issuer 10", "10", "2y", "", 0.307621389),
    ("trade_49", "Issuer 10", "10", "3y", "", 1.073502362),
    ("trade_50", "Issuer 10", "10", "5y", "", 561.9736274),
    ("trade_51", "Issuer 11", "11", "10y", "", 128.7909159),
    ("trade_52", "Issuer 11", "11", "1y", "", 0.179342208),
    ("trade_53", "Issuer 11", "11", "2y", "", 0.142506059),
    ("trade_54", "Issuer 11", "11", "3y", "", 0.253435337),
    ("trade_55", "Issuer 11", "11", "5y", "", 160.1397076),
    ("trade_56", "Issuer 12", "12", "10y", "", 0.0),
    ("trade_57", "Issuer 12", "12", "1y", "", -0.054311349),
    ("trade_58", "Issuer 12", "12", "2y", "", -0.065199114),
    ("trade_59", "Issuer 12", "12", "3y", "", 121.3343297),
    ("trade_60", "Issuer 12", "12", "5y", "", 227.1665079),
    ("trade_61", "Issuer 13", "Residual", "10y", "", 0.0),
    ("trade_62", "Issuer 13", "Residual", "1y", "", 2.50268281),
    ("trade_63", "Issuer 13", "Residual", "2y", "", 92.21211014),
    ("trade_64", "Issuer 13", "Residual", "3y", "", 1759.025026),
    ("trade_65", "Issuer 13", "Residual", "5y", "", 0.0),
];

pub const EQ_VEGA: &[Row] = &[
    ("trade_01", "Index 1", "1", "10y", "", 30978.0),
    ("trade_02", "Index 2", "2", "15y", "", -84500.0),
    ("trade_03", "Index 3", "3", "1m", "", 76151.0),
    ("trade_04", "Index 4", "4", "1y", "", 33874.0),
    ("trade_05", "Index 5", "5", "20y", "", -30601.0),
    ("trade_06", "Index 6", "6", "2w", "", -7477.0),
    ("trade_07", "Index 7", "7", "2y", "", 25620.0),
    ("trade_08", "Index 8", "8", "30y", "", -93715.0),
    ("trade_09", "Index 9", "9", "3m", "", 71886.0),
    ("trade_10", "Index 10", "10", "3y", "", 89441.0),
    ("trade_11", "Index 11", "11", "5y", "", 91291.0),
    ("trade_12", "Index 12", "Residual", "6m", "", -97488.0),
    ("trade_13", "Index 13", "1", "3y", "", -83834.0),
    ("trade_14", "Index 14", "2", "6m", "", -11187.0),
    ("trade_15", "Index 15", "3", "20y", "", 72452.0),
    ("trade_16", "Index 16", "4", "15y", "", 30107.0),
    ("trade_17", "Index 17", "5", "3m", "", -63652.0),
    ("trade_18", "Index 18", "6", "10y", "", 48292.0),
    ("trade_19", "Index 19", "7", "5y", "", 47965.0),
    ("trade_20", "Index 20", "8", "1m", "", 1176.0),
    ("trade_21", "Index 21", "9", "2w", "", -77590.0),
    ("trade_22", "Index 22", "10", "1y", "", 54767.0),
    ("trade_23", "Index 23", "11", "30y", "", 27328.0),
    ("trade_24", "Index 24", "Residual", "2y", "", 11619.0),
];

pub const IR_CURVATURE: &[Row] = &[
    ("trade_01", "JPY", "", "10y", "", -0.674945464),
    ("trade_02", "JPY", "", "15y", "", 0.214918959),
    ("trade_03", "JPY", "", "1m", "", 150.54),
    ("trade_04", "JPY", "", "1y", "", 180.2179924),
    ("trade_05", "JPY", "", "20y", "", -4.855517386),
    ("trade_06", "JPY", "", "2w", "", 142.34),
    ("trade_07", "JPY", "", "2y", "", -248.87265),
    ("trade_08", "JPY", "", "30y", "", 0.15),
    ("trade_09", "JPY", "", "3m", "", 175.87),
    ("trade_10", "JPY", "", "3y", "", -0.320327219),
    ("trade_11", "JPY", "", "5y", "", -0.382417661),
    ("trade_12", "JPY", "", "6m", "", 214.8661535),
    ("trade_13", "USD", "", "10y", "", 0.052926029),
    ("trade_14", "USD", "", "15y", "", 1.943209281),
    ("trade_15", "USD", "", "1m", "", -551.1838664),
    ("trade_16", "USD", "", "1y", "", 406.1091135),
    ("trade_17", "USD", "", "20y", "", 1.177550257),
    ("trade_18", "USD", "", "2w", "", -598.8791558),
    ("trade_19", "USD", "", "2y", "", 0.011233741),
    ("trade_20", "USD", "", "30y", "", 2.872250894),
    ("trade_21", "USD", "", "3m", "", -1173.64531),
    ("trade_22", "USD", "", "3y", "", 5.45),
    ("trade_23", "USD", "", "5y", "", 2.65),
    ("trade_24", "USD", "", "6m", "", -874.26),
    ("trade_25", "BRL", "", "10y", "", 6.78),
    ("trade_26", "BRL", "", "15y", "", 3.45),
    ("trade_27", "BRL", "", "1m", "", -468.24),
    ("trade_28", "BRL", "", "1y", "", 305.48),
    ("trade_29", "BRL", "", "20y", "", 2.13),
    ("trade_30", "BRL", "", "2w", "", -689.56),
    ("trade_31", "BRL", "", "2y", "", 2.1),
    ("trade_32", "BRL", "", "30y", "", 1.2),
    ("trade_33", "BRL", "", "3m", "", -1059.63),
    ("trade_34", "BRL", "", "3y", "", 6.32),
    ("trade_35", "BRL", "", "5y", "", 1.24),
    ("trade_36", "BRL", "", "6m", "", -785.69),
];

/// `(product class, risk type, row)` records of a mixed portfolio.
pub const MIXED: &[(ProductClass, RiskType, Row)] = &[
    (ProductClass::RatesFX, RiskType::IRCurve, ("trade_01", "USD", "1", "5y", "Libor1m", 1053.45)),
    (ProductClass::Credit, RiskType::IRCurve, ("trade_02", "USD", "1", "5y", "Libor1m", 2053.45)),
    (ProductClass::Equity, RiskType::IRCurve, ("trade_03", "USD", "1", "5y", "Libor1m", 3053.45)),
    (ProductClass::Commodity, RiskType::IRCurve, ("trade_04", "USD", "1", "5y", "Libor1m", 4053.45)),
    (ProductClass::RatesFX, RiskType::FX, ("trade_05", "IDR", "", "", "", 5402.350999)),
    (ProductClass::RatesFX, RiskType::FX, ("trade_06", "JPY", "", "", "", -34390.56314)),
    (ProductClass::Credit, RiskType::FX, ("trade_07", "IDR", "", "", "", 5402.350999)),
    (ProductClass::Credit, RiskType::FX, ("trade_08", "JPY", "", "", "", -34390.56314)),
    (ProductClass::Equity, RiskType::FX, ("trade_09", "IDR", "", "", "", 5402.350999)),
    (ProductClass::Equity, RiskType::FX, ("trade_10", "JPY", "", "", "", -34390.56314)),
    (ProductClass::Commodity, RiskType::FX, ("trade_11", "IDR", "", "", "", 5402.350999)),
    (ProductClass::Commodity, RiskType::FX, ("trade_12", "JPY", "", "", "", -34390.56314)),
    (ProductClass::Credit, RiskType::CreditQ, ("trade_13", "Issuer 1", "1", "1y", "", 8050.0)),
    (ProductClass::Credit, RiskType::CreditNonQ, ("trade_14", "Issuer 1", "1", "1y", "", -1544.867056)),
    (ProductClass::Equity, RiskType::Equity, ("trade_15", "Index 1", "1", "", "", 1730.821481)),
    (ProductClass::Commodity, RiskType::Commodity, ("trade_16", "Coal Americas", "1", "", "", -2335.613204)),
    (ProductClass::RatesFX, RiskType::IRVol, ("trade_17", "JPY", "", "1y", "", 180.2179924)),
    (ProductClass::RatesFX, RiskType::FXVol, ("trade_18", "JPYUSD", "", "15y", "", -20652.952)),
    (ProductClass::Credit, RiskType::CreditVol, ("trade_19", "Issuer 1", "1", "1y", "", 167.65)),
    (ProductClass::Credit, RiskType::CreditVolNonQ, ("trade_20", "Issuer 1", "1", "1y", "", 5673.21)),
    (ProductClass::Equity, RiskType::EquityVol, ("trade_21", "Index 1", "1", "10y", "", 30978.0)),
    (ProductClass::Commodity, RiskType::CommodityVol, ("trade_22", "Coal Americas", "1", "10y", "", -1812.0)),
];
