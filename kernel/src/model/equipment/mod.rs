use rust_decimal::Decimal;

use crate::model::id::EquipmentId;

#[derive(Debug, Clone, PartialEq)]
pub struct Equipment {
    pub equipment_id: EquipmentId,
    pub equipment_name: String,
    pub unit_price: Decimal,
    pub total_stock: i32,
    pub category: String,
}
