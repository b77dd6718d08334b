pub mod a025_crm_deal;
