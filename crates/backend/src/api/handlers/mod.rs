// Dashboard handlers (d402)
pub mod d402_sales_funnel;
